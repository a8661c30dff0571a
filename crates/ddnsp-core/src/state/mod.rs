// # Store Implementations
//
// This module provides the in-memory implementations of the RecordStore
// and TxtStore traits.

pub mod memory;

pub use memory::{MemoryRecordStore, MemoryTxtStore};
