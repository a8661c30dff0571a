// # Record Store Trait
//
// Defines the repository interface for the authoritative
// hostname → DNS record mapping.
//
// ## Purpose
//
// The record store is the single source of truth for A/AAAA state. The
// engine validates a request completely, then hands the store a
// `RecordPatch`; the store merges it over whatever is already there.
//
// ## Implementations
//
// - In-memory: `MemoryRecordStore` (this crate)
// - Future: SQLite, Redis, etc.
//
// ## Usage
//
// ```rust,ignore
// use ddnsp_core::traits::{RecordPatch, RecordStore};
//
// let outcome = store
//     .upsert("home.example.com", RecordPatch::ipv4("93.184.216.34".parse()?))
//     .await?;
// println!("{:?}", outcome.record());
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::validation::Ttl;

/// Stored A/AAAA state for one hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// IPv4 address, if one was ever set
    pub ipv4: Option<Ipv4Addr>,
    /// IPv6 address, if one was ever set
    pub ipv6: Option<Ipv6Addr>,
    /// Time-to-live, always within bounds
    pub ttl: Ttl,
    /// Timestamp of the last write
    pub updated_at: DateTime<Utc>,
}

impl DomainRecord {
    /// Build a fresh record from a patch
    pub(crate) fn from_patch(patch: &RecordPatch) -> Self {
        Self {
            ipv4: patch.ipv4,
            ipv6: patch.ipv6,
            ttl: patch.ttl.unwrap_or_default(),
            updated_at: Utc::now(),
        }
    }

    /// Merge a patch into this record
    ///
    /// Fields the patch leaves as `None` keep their current value.
    pub(crate) fn apply(&mut self, patch: &RecordPatch) {
        if let Some(ip) = patch.ipv4 {
            self.ipv4 = Some(ip);
        }
        if let Some(ip) = patch.ipv6 {
            self.ipv6 = Some(ip);
        }
        if let Some(ttl) = patch.ttl {
            self.ttl = ttl;
        }
        self.updated_at = Utc::now();
    }
}

/// A merge-patch over a [`DomainRecord`]
///
/// `None` means "keep what is stored". A `None` TTL on a new record
/// falls back to the default TTL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    /// New IPv4 address
    pub ipv4: Option<Ipv4Addr>,
    /// New IPv6 address
    pub ipv6: Option<Ipv6Addr>,
    /// New TTL
    pub ttl: Option<Ttl>,
}

impl RecordPatch {
    /// Patch that only sets the IPv4 address
    pub fn ipv4(ip: Ipv4Addr) -> Self {
        Self {
            ipv4: Some(ip),
            ..Self::default()
        }
    }

    /// Patch that only sets the IPv6 address
    pub fn ipv6(ip: Ipv6Addr) -> Self {
        Self {
            ipv6: Some(ip),
            ..Self::default()
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Result of an upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertResult {
    /// Record didn't exist before
    Created {
        /// The stored record
        record: DomainRecord,
    },
    /// Record existed and was merged
    Updated {
        /// The record as it was before the merge
        previous: DomainRecord,
        /// The stored record
        record: DomainRecord,
    },
}

impl UpsertResult {
    /// The record as stored after the upsert
    pub fn record(&self) -> &DomainRecord {
        match self {
            UpsertResult::Created { record } | UpsertResult::Updated { record, .. } => record,
        }
    }

    /// The record as it was before the upsert, if any
    pub fn previous(&self) -> Option<&DomainRecord> {
        match self {
            UpsertResult::Created { .. } => None,
            UpsertResult::Updated { previous, .. } => Some(previous),
        }
    }

    /// Consume and return the stored record
    pub fn into_record(self) -> DomainRecord {
        match self {
            UpsertResult::Created { record } | UpsertResult::Updated { record, .. } => record,
        }
    }
}

/// Repository for hostname → [`DomainRecord`]
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Atomicity
///
/// `upsert` is a single read-modify-write step per hostname: two
/// concurrent upserts to the same hostname must never interleave into a
/// record that mixes fields in a way neither call produced. Upserts to
/// different hostnames should not block each other.
///
/// # Implementation Guidelines
///
/// - **No business logic**: validation belongs to the engine; the store
///   receives only validated values
/// - **Explicit flush**: `flush()` must persist all pending changes
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Merge `patch` over the record for `hostname`, creating it if absent
    ///
    /// Stamps `updated_at` with the current time.
    async fn upsert(
        &self,
        hostname: &str,
        patch: RecordPatch,
    ) -> Result<UpsertResult, crate::Error>;

    /// Get the record for `hostname`
    ///
    /// # Returns
    ///
    /// - `Ok(DomainRecord)`: The stored record
    /// - `Err(Error::NotFound)`: No record for this hostname
    /// - `Err(Error)`: Storage error
    async fn get(&self, hostname: &str) -> Result<DomainRecord, crate::Error>;

    /// List all records, in no particular order
    async fn list(&self) -> Result<Vec<(String, DomainRecord)>, crate::Error>;

    /// Delete the record for `hostname`
    ///
    /// Returns `true` if a record was removed.
    async fn delete(&self, hostname: &str) -> Result<bool, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_keeps_omitted_fields() {
        let ttl = Ttl::new(600).unwrap();
        let mut record = DomainRecord::from_patch(
            &RecordPatch::ipv4(Ipv4Addr::new(93, 184, 216, 34)).with_ttl(ttl),
        );
        record.apply(&RecordPatch::ipv6("2001:db8::1".parse().unwrap()));

        assert_eq!(record.ipv4, Some(Ipv4Addr::new(93, 184, 216, 34)));
        assert_eq!(record.ipv6, Some("2001:db8::1".parse().unwrap()));
        assert_eq!(record.ttl, ttl);
    }

    #[test]
    fn new_record_defaults_ttl() {
        let record = DomainRecord::from_patch(&RecordPatch::default());
        assert_eq!(record.ttl, Ttl::default());
        assert_eq!(record.ipv4, None);
    }

    #[test]
    fn upsert_result_accessors() {
        let record = DomainRecord::from_patch(&RecordPatch::default());
        let created = UpsertResult::Created {
            record: record.clone(),
        };
        assert!(created.previous().is_none());
        assert_eq!(created.record(), &record);

        let updated = UpsertResult::Updated {
            previous: record.clone(),
            record: record.clone(),
        };
        assert_eq!(updated.previous(), Some(&record));
        assert_eq!(updated.into_record(), record);
    }
}
