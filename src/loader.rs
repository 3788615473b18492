// File: src/loader.rs
use crate::core::types::Dataset;
use crate::error::LoadError;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Reads the extracted nutrition document. Any failure is fatal for the
/// catalog; there is no retry.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    let reader = BufReader::new(file);
    let dataset: Dataset =
        serde_json::from_reader(reader).map_err(|e| LoadError::Parse(path.to_path_buf(), e))?;

    validate(&dataset)?;
    info!("loaded {} drinks from {}", dataset.drinks.len(), path.display());
    Ok(dataset)
}

/// Same checks as [`load_dataset`], for a document already in memory.
pub fn parse_dataset(text: &str) -> Result<Dataset, LoadError> {
    let dataset: Dataset = serde_json::from_str(text)?;
    validate(&dataset)?;
    Ok(dataset)
}

fn validate(dataset: &Dataset) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for drink in &dataset.drinks {
        if !seen.insert(drink.id.as_str()) {
            return Err(LoadError::DuplicateId(drink.id.clone()));
        }
    }

    if let Some(total) = dataset.metadata.total_drinks {
        if total != dataset.drinks.len() {
            warn!(
                "metadata says {total} drinks but the document holds {}",
                dataset.drinks.len()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const DOC: &str = r#"{
        "drinks": [
            {"id": "caffe_latte", "name": "Caffè Latte", "sizes": [
                {"size": "Tall", "milkVariants": [
                    {"milkType": "Whole Milk", "nutrition": {"calories": 190, "fat": "7.0", "caffeine": "75"}},
                    {"milkType": "Oat Milk", "nutrition": {"calories": 170}}
                ]}
            ]}
        ],
        "metadata": {"source": "https://example.com/nutrition.pdf", "extracted_at": "2025-04-01T10:00:00", "total_drinks": 1}
    }"#;

    #[test]
    fn test_load_dataset_reads_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nutrition_data.json");
        fs::write(&path, DOC).unwrap();

        let dataset = load_dataset(&path).unwrap();
        assert_eq!(dataset.drinks.len(), 1);
        assert_eq!(dataset.metadata.total_drinks, Some(1));
        let latte = dataset.drink("caffe_latte").unwrap();
        let oat = latte.variant("Tall", "Oat Milk").unwrap();
        assert_eq!(oat.nutrition.display("calories"), "170 kcal");
        assert_eq!(oat.nutrition.display("fat"), "not available");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_dataset(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io(..)));
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{"drinks": [{"id": "x"}]}"#).unwrap();
        assert!(matches!(load_dataset(&path).unwrap_err(), LoadError::Parse(..)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dupes.json");
        fs::write(
            &path,
            r#"{"drinks": [{"id": "a", "name": "A", "sizes": []}, {"id": "a", "name": "B", "sizes": []}]}"#,
        )
        .unwrap();
        assert!(matches!(load_dataset(&path).unwrap_err(), LoadError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn test_parse_dataset_validates_too() {
        let err = parse_dataset(
            r#"{"drinks": [{"id": "a", "name": "A", "sizes": []}, {"id": "a", "name": "B", "sizes": []}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId(id) if id == "a"));
        assert!(matches!(parse_dataset(r#"{"drinks": 3}"#).unwrap_err(), LoadError::Malformed(_)));
    }

    #[test]
    fn test_metadata_is_optional() {
        let dataset = parse_dataset(r#"{"drinks": []}"#).unwrap();
        assert_eq!(dataset.metadata, Default::default());
    }
}
