//! Repository traits
//!
//! The engine talks to its state only through these interfaces, so a
//! persistent backend can replace the in-memory ones without touching
//! validation or orchestration.
//!
//! - [`RecordStore`]: hostname → A/AAAA record
//! - [`TxtStore`]: hostname → set of TXT values

pub mod record_store;
pub mod txt_store;

pub use record_store::{DomainRecord, RecordPatch, RecordStore, UpsertResult};
pub use txt_store::TxtStore;
