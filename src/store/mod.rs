//! Image metadata records and the store abstraction over their persistence.
//!
//! The store owns the full collection of [`ImageRecord`]s. Backends are
//! swappable behind [`MetadataStore`]: a whole-file JSON store for production
//! and an in-memory store for tests.

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted metadata describing one processed image.
///
/// Field names serialize in camelCase to match the public API wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Opaque unique identifier, generated at upload time.
    pub id: String,
    /// Client-supplied filename, unvalidated.
    pub original_name: String,
    /// Relative public path to the processed artifact.
    pub processed_url: String,
    /// Creation timestamp, set once.
    pub uploaded_at: DateTime<Utc>,
}

impl ImageRecord {
    /// Create a new record stamped with the current time.
    pub fn new(id: String, original_name: String, processed_url: String) -> Self {
        Self {
            id,
            original_name,
            processed_url,
            uploaded_at: Utc::now(),
        }
    }
}

/// Storage backend for the image metadata collection.
///
/// The collection is read and written wholesale; `append` and `remove` are
/// read-modify-write and not mutually exclusive across concurrent callers,
/// so racing writers lose updates (last writer wins).
pub trait MetadataStore: Send + Sync {
    /// Return the whole persisted collection in creation order.
    ///
    /// Unreadable or corrupt storage degrades to an empty collection; this
    /// never fails the caller.
    fn load_all(&self) -> Vec<ImageRecord>;

    /// Append a record to the collection.
    fn append(&self, record: ImageRecord) -> Result<()>;

    /// Remove the record with the given id, returning whether it was found.
    fn remove(&self, id: &str) -> Result<bool>;

    /// Find a record by id.
    fn find_by_id(&self, id: &str) -> Option<ImageRecord> {
        self.load_all().into_iter().find(|r| r.id == id)
    }
}
