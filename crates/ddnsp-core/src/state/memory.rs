// # Memory Stores
//
// In-memory implementations of RecordStore and TxtStore.
//
// ## Purpose
//
// Authoritative state for the lifetime of the process. Nothing survives a
// restart; a persistent backend implements the same traits.
//
// ## Locking
//
// Both stores sit on a `DashMap`. Every read-modify-write goes through
// `entry()`, which holds the shard lock for that key for the whole step,
// so concurrent writes to one hostname serialize while writes to other
// hostnames proceed in parallel. No lock is ever held across an `.await`.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use indexmap::IndexSet;
use std::sync::Arc;

use crate::Error;
use crate::traits::record_store::{DomainRecord, RecordPatch, RecordStore, UpsertResult};
use crate::traits::txt_store::TxtStore;

/// In-memory record store
///
/// # Example
///
/// ```rust,no_run
/// use ddnsp_core::state::MemoryRecordStore;
/// use ddnsp_core::traits::{RecordPatch, RecordStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     store.upsert("home.example.com", RecordPatch::ipv4("93.184.216.34".parse()?)).await?;
///
///     let record = store.get("home.example.com").await?;
///     assert_eq!(record.ipv4, Some("93.184.216.34".parse()?));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<DashMap<String, DomainRecord>>,
}

impl MemoryRecordStore {
    /// Create a new empty record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records in the store
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Clear all records from the store
    pub fn clear(&self) {
        self.inner.clear();
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(&self, hostname: &str, patch: RecordPatch) -> Result<UpsertResult, Error> {
        let outcome = match self.inner.entry(hostname.to_string()) {
            Entry::Occupied(mut entry) => {
                let previous = entry.get().clone();
                entry.get_mut().apply(&patch);
                UpsertResult::Updated {
                    previous,
                    record: entry.get().clone(),
                }
            }
            Entry::Vacant(entry) => {
                let record = DomainRecord::from_patch(&patch);
                entry.insert(record.clone());
                UpsertResult::Created { record }
            }
        };
        Ok(outcome)
    }

    async fn get(&self, hostname: &str) -> Result<DomainRecord, Error> {
        self.inner
            .get(hostname)
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::not_found(hostname))
    }

    async fn list(&self) -> Result<Vec<(String, DomainRecord)>, Error> {
        Ok(self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect())
    }

    async fn delete(&self, hostname: &str) -> Result<bool, Error> {
        Ok(self.inner.remove(hostname).is_some())
    }

    async fn flush(&self) -> Result<(), Error> {
        // No-op for memory store (everything is already "persisted")
        Ok(())
    }
}

/// In-memory TXT store
///
/// Values keep their insertion order; sets are created on first add and
/// dropped when emptied.
#[derive(Debug, Clone, Default)]
pub struct MemoryTxtStore {
    inner: Arc<DashMap<String, IndexSet<String>>>,
}

impl MemoryTxtStore {
    /// Create a new empty TXT store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hostnames with at least one value
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl TxtStore for MemoryTxtStore {
    async fn add(&self, hostname: &str, value: &str) -> Result<usize, Error> {
        let mut set = self.inner.entry(hostname.to_string()).or_default();
        set.insert(value.to_string());
        Ok(set.len())
    }

    async fn remove(&self, hostname: &str, value: Option<&str>) -> Result<(), Error> {
        let Some(value) = value else {
            self.inner.remove(hostname);
            return Ok(());
        };

        if let Entry::Occupied(mut entry) = self.inner.entry(hostname.to_string()) {
            entry.get_mut().shift_remove(value);
            if entry.get().is_empty() {
                entry.remove();
            }
        }
        Ok(())
    }

    async fn get(&self, hostname: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .inner
            .get(hostname)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
