// # TXT Store Trait
//
// Defines the repository interface for challenge records: each hostname
// maps to a set of distinct TXT values.
//
// Writes accumulate rather than replace. A wildcard certificate order
// asks for two DNS-01 challenges under the same `_acme-challenge` name,
// and both values have to be visible at the same time.

use async_trait::async_trait;

/// Repository for hostname → set of TXT values
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
/// `add` and `remove` are single read-modify-write steps per hostname.
///
/// # Idempotency
///
/// `remove` never fails because something is already gone: deleting an
/// unknown value or an unknown hostname is a successful no-op.
#[async_trait]
pub trait TxtStore: Send + Sync {
    /// Add `value` to the set for `hostname`, creating the set if needed
    ///
    /// Duplicate values are absorbed.
    ///
    /// # Returns
    ///
    /// The number of values in the set after the add.
    async fn add(&self, hostname: &str, value: &str) -> Result<usize, crate::Error>;

    /// Remove one value, or the whole set when `value` is `None`
    ///
    /// Removing the last value removes the set.
    async fn remove(&self, hostname: &str, value: Option<&str>) -> Result<(), crate::Error>;

    /// Values for `hostname`, in insertion order (empty if unknown)
    async fn get(&self, hostname: &str) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
