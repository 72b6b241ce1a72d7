//! In-memory metadata store.
//!
//! Stores all records in memory with no persistence.  Useful for tests and
//! ephemeral deployments.  Uses `RwLock<HashMap>` for thread-safe access.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use super::store::{MetadataStore, PhotoRecord};

pub struct MemoryMetadataStore {
    records: RwLock<HashMap<String, PhotoRecord>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().expect("rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn put_photo(
        &self,
        record: PhotoRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut records = self.records.write().expect("rwlock poisoned");
            records.insert(record.photo_id.clone(), record);
            Ok(())
        })
    }

    fn get_photo(
        &self,
        photo_id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<PhotoRecord>>> + Send + '_>> {
        let photo_id = photo_id.to_string();
        Box::pin(async move {
            let records = self.records.read().expect("rwlock poisoned");
            Ok(records.get(&photo_id).cloned())
        })
    }
}

// -- Tests --------------------------------------------------------------------
