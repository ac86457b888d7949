//! In-memory metadata store used by tests and embedded setups.

use parking_lot::RwLock;

use crate::error::Result;

use super::{ImageRecord, MetadataStore};

/// [`MetadataStore`] backed by an in-process Vec.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<ImageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryStore {
    fn load_all(&self) -> Vec<ImageRecord> {
        self.records.read().clone()
    }

    fn append(&self, record: ImageRecord) -> Result<()> {
        self.records.write().push(record);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }
}
