//! Error types for the catalog library.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to bring up the dataset. The catalog is unusable until restart.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read dataset `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("dataset `{0}` is not a valid nutrition document")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("text is not a valid nutrition document")]
    Malformed(#[from] serde_json::Error),

    #[error("dataset lists drink id `{0}` more than once")]
    DuplicateId(String),
}

/// Failure of a single key-value store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error")]
    Io(#[from] std::io::Error),

    #[error("cannot replace stored value")]
    Persist(#[from] tempfile::PersistError),

    #[error("cannot encode value for `{0}`")]
    Encode(String, #[source] serde_json::Error),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),
}
