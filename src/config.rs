//! `catalog.toml` configuration.
//!
//! Every field is optional; a missing file means all defaults. Command-line
//! flags are applied on top by the binary.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";
pub const DEFAULT_DATASET: &str = "nutrition_data.json";
const APP_DIR: &str = "nutrition-catalog";
const LOG_FILE: &str = "catalog.log";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Extracted nutrition document.
    pub dataset: PathBuf,
    /// Where favorites, usage stats and flags are kept.
    pub state_dir: PathBuf,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from(DEFAULT_DATASET),
            state_dir: default_state_dir(),
            log_filter: "info".to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        text.parse()
    }

    /// Loads `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join(LOG_FILE)
    }
}

impl FromStr for CatalogConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: CatalogConfig = r#"dataset = "data/drinks.json""#.parse().unwrap();
        assert_eq!(config.dataset, PathBuf::from("data/drinks.json"));
        assert_eq!(config.log_filter, "info");
        assert!(config.state_dir.ends_with(APP_DIR));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = "debounce_ms = 10".parse::<CatalogConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = CatalogConfig::load_or_default(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_log_path_inside_state_dir() {
        let config = CatalogConfig {
            state_dir: PathBuf::from("/tmp/state"),
            ..CatalogConfig::default()
        };
        assert_eq!(config.log_path(), PathBuf::from("/tmp/state/catalog.log"));
    }
}
