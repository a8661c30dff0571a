// # ddnsp-core
//
// Core library for the dynamic-DNS update engine.
//
// ## Architecture Overview
//
// This library holds everything between a parsed request and a rendered
// response:
// - **AuthResolver**: bearer/API-key and basic credential checks
// - **validation**: hostname, address, TTL and TXT value rules
// - **IpResolver**: caller address detection for `"auto"`
// - **RecordStore** / **TxtStore**: repository traits for A/AAAA and TXT state
// - **UpdateEngine**: the service instance that runs every operation
// - **LegacyReply** / **ApiResponse**: DynDNS2 text and JSON envelopes
//
// ## Design Principles
//
// 1. **Transport-agnostic**: requests arrive as a `RequestContext` plus a
//    typed body; no HTTP types cross this boundary
// 2. **Validate, then write**: single-item operations never partially mutate
// 3. **Repository seams**: stores sit behind traits so a persistent backend
//    can replace the in-memory one
// 4. **No globals**: stores and the token registry are owned by one engine

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod legacy;
pub mod registry;
pub mod response;
pub mod state;
pub mod traits;
pub mod transport;
pub mod validation;

// Re-export core types for convenience
pub use auth::{AuthResolver, Principal};
pub use config::{AuthConfig, DdnsConfig, EngineConfig, IpResolverConfig};
pub use engine::{EngineEvent, UpdateEngine};
pub use error::{Error, Result};
pub use legacy::{LegacyReply, LegacyResponse};
pub use registry::{MemoryTokenRegistry, TokenRegistry};
pub use response::ApiResponse;
pub use state::{MemoryRecordStore, MemoryTxtStore};
pub use traits::{RecordStore, TxtStore};
pub use transport::{IpResolver, RequestContext};
