//! Whole-file JSON metadata store.
//!
//! The entire collection lives in one pretty-printed JSON array file that is
//! read and rewritten on every mutation. A load failure of any kind (missing
//! file, bad JSON) is treated as an empty collection so a damaged metadata
//! file never takes the service down.

use std::path::PathBuf;

use crate::error::{Error, Result};

use super::{ImageRecord, MetadataStore};

/// File-backed [`MetadataStore`] holding a single JSON array.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the given file. The file is created lazily
    /// on first write; call [`ensure_file`](Self::ensure_file) to seed it.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Create the parent directory and seed an empty collection if the file
    /// does not exist yet.
    pub fn ensure_file(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if !self.path.exists() {
            self.save(&[])?;
        }
        Ok(())
    }

    fn load(&self) -> Vec<ImageRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to read metadata file {:?}: {}", self.path, e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to parse metadata file {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[ImageRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| Error::persistence(format!("Failed to serialize metadata: {}", e)))?;
        std::fs::write(&self.path, json).map_err(|e| {
            Error::persistence(format!(
                "Failed to write metadata file {:?}: {}",
                self.path, e
            ))
        })
    }
}

impl MetadataStore for JsonFileStore {
    fn load_all(&self) -> Vec<ImageRecord> {
        self.load()
    }

    fn append(&self, record: ImageRecord) -> Result<()> {
        let mut records = self.load();
        records.push(record);
        self.save(&records)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let mut records = self.load();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ImageRecord {
        ImageRecord::new(
            id.to_string(),
            format!("{id}.png"),
            format!("/processed/{id}_processed.png"),
        )
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("images.json"));
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.json");
        std::fs::write(&path, "{not valid json]").unwrap();

        let store = JsonFileStore::new(path);
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_ensure_file_seeds_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("images.json");
        let store = JsonFileStore::new(path.clone());
        store.ensure_file().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn test_append_find_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("images.json"));

        store.append(record("a")).unwrap();
        store.append(record("b")).unwrap();

        assert_eq!(store.load_all().len(), 2);
        assert_eq!(store.find_by_id("a").unwrap().id, "a");
        assert!(store.find_by_id("missing").is_none());

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.load_all().len(), 1);
        assert_eq!(store.load_all()[0].id, "b");
    }

    #[test]
    fn test_collection_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.json");

        {
            let store = JsonFileStore::new(path.clone());
            store.append(record("persisted")).unwrap();
        }

        let store = JsonFileStore::new(path);
        let records = store.load_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original_name, "persisted.png");
    }

    #[test]
    fn test_preserves_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("images.json"));

        for id in ["first", "second", "third"] {
            store.append(record(id)).unwrap();
        }

        let ids: Vec<_> = store.load_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }
}
