//! Core update engine
//!
//! The UpdateEngine is responsible for:
//! - Checking credentials against the token registry
//! - Validating every request before any store write
//! - Resolving `"auto"` addresses from request metadata
//! - Applying merge-patches to the record store and accumulating TXT values
//! - Emitting events for monitoring/logging
//!
//! ## Architecture
//!
//! ```text
//!  RequestContext + body
//!          │
//!          ▼
//!  ┌──────────────┐   ┌────────────┐   ┌────────────┐
//!  │ AuthResolver │──▶│ validation │──▶│ IpResolver │ (auto only)
//!  └──────────────┘   └────────────┘   └────────────┘
//!                                             │
//!         ┌───────────────────────────────────┼──────────────────┐
//!         ▼                                   ▼                  ▼
//!  ┌─────────────┐                     ┌────────────┐     ┌─────────────┐
//!  │ RecordStore │                     │  TxtStore  │     │   Events    │
//!  │ (upsert)    │                     │ (add/rm)   │     │  (notify)   │
//!  └─────────────┘                     └────────────┘     └─────────────┘
//! ```
//!
//! ## Operations
//!
//! - [`UpdateEngine::update`]: one hostname, fail-fast
//! - [`UpdateEngine::bulk_update`]: up to 100 hostnames, per-item outcomes
//! - [`UpdateEngine::txt_add`], [`UpdateEngine::txt_delete`], [`UpdateEngine::txt_get`]
//! - [`UpdateEngine::status`], [`UpdateEngine::domains`]
//! - [`UpdateEngine::legacy_update`]: DynDNS2 text protocol

mod bulk;
mod legacy;
mod txt;
mod update;

pub use bulk::{BulkItem, BulkOutcome, BulkResult, BulkSummary, BulkUpdateRequest, BulkUpdateResponse};
pub use txt::{TxtAddRequest, TxtAddResponse, TxtDeleteRequest, TxtDeleteResponse, TxtGetResponse};
pub use update::{DomainsResponse, RecordResponse, UpdateRequest};

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::auth::{AuthResolver, Principal};
use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::registry::{MemoryTokenRegistry, TokenRegistry};
use crate::state::{MemoryRecordStore, MemoryTxtStore};
use crate::traits::{RecordStore, TxtStore, UpsertResult};
use crate::transport::{IpResolver, RequestContext};
use crate::validation::Ttl;

/// Events emitted by the UpdateEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// First write for a hostname
    RecordCreated {
        hostname: String,
        ipv4: Option<Ipv4Addr>,
        ipv6: Option<Ipv6Addr>,
    },

    /// A stored record changed
    RecordUpdated {
        hostname: String,
        ipv4: Option<Ipv4Addr>,
        ipv6: Option<Ipv6Addr>,
        previous_ipv4: Option<Ipv4Addr>,
        previous_ipv6: Option<Ipv6Addr>,
    },

    /// A write left addresses and TTL as they were
    RecordUnchanged { hostname: String },

    /// A TXT value was added
    TxtAdded {
        hostname: String,
        record_count: usize,
    },

    /// TXT values were deleted (all of them when `value` is `None`)
    TxtDeleted {
        hostname: String,
        value: Option<String>,
    },

    /// A bulk batch finished
    BulkCompleted {
        total: usize,
        successful: usize,
        failed: usize,
    },

    /// A request was refused for missing or unknown credentials
    AuthRejected { endpoint: &'static str },

    /// Engine stopped
    Stopped { reason: String },
}

/// Core update engine
///
/// One instance owns the record store, the TXT store and the token
/// registry handle. Construct it once and share it (`Arc<UpdateEngine>`)
/// with every request handler.
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateEngine::new()`] (or [`UpdateEngine::in_memory()`])
/// 2. Serve requests from any number of tasks
/// 3. Call [`UpdateEngine::shutdown()`] to flush stores
///
/// ## Threading
///
/// Every operation takes `&self`; the engine is `Send + Sync`. Writes to
/// the same hostname are serialized by the store, writes to different
/// hostnames are not.
pub struct UpdateEngine {
    /// Authoritative A/AAAA state
    records: Arc<dyn RecordStore>,

    /// Authoritative TXT state
    txt: Arc<dyn TxtStore>,

    /// Credential checks
    auth: AuthResolver,

    /// Caller address detection for `"auto"`
    ip_resolver: IpResolver,

    /// TTL reported for TXT adds without one
    txt_default_ttl: Ttl,

    /// Cap on comma-separated hostnames in one legacy request
    legacy_max_hostnames: usize,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl UpdateEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `records`: Record store implementation
    /// - `txt`: TXT store implementation
    /// - `tokens`: Token registry used for every credential check
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        records: Arc<dyn RecordStore>,
        txt: Arc<dyn TxtStore>,
        tokens: Arc<dyn TokenRegistry>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);
        let txt_default_ttl = Ttl::new(i64::from(config.engine.txt_default_ttl))?;

        let engine = Self {
            records,
            txt,
            auth: AuthResolver::new(tokens, config.auth),
            ip_resolver: IpResolver::new(config.ip_resolver),
            txt_default_ttl,
            legacy_max_hostnames: config.engine.legacy_max_hostnames,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Create an engine over fresh in-memory stores
    ///
    /// The token registry is seeded from `config.tokens`.
    pub fn in_memory(config: DdnsConfig) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        let tokens = MemoryTokenRegistry::from_tokens(config.tokens.iter().cloned());
        Self::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryTxtStore::new()),
            Arc::new(tokens),
            config,
        )
    }

    /// Flush both stores and emit [`EngineEvent::Stopped`]
    pub async fn shutdown(&self, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();

        self.records.flush().await?;
        self.txt.flush().await?;
        info!("Stores flushed, engine stopped ({})", reason);

        self.emit_event(EngineEvent::Stopped { reason });
        Ok(())
    }

    /// Check a bearer token or API key, rejecting the request otherwise
    fn authorize(&self, ctx: &RequestContext, endpoint: &'static str) -> Result<Principal> {
        match self.auth.resolve_bearer_or_key(ctx) {
            Some(principal) => {
                debug!("Authorized {} for {}", principal, endpoint);
                Ok(principal)
            }
            None => {
                warn!("Rejected credentials on {}", endpoint);
                self.emit_event(EngineEvent::AuthRejected { endpoint });
                Err(Error::Unauthorized)
            }
        }
    }

    /// Emit the event matching an upsert outcome
    fn emit_upsert_event(&self, hostname: &str, outcome: &UpsertResult) {
        let event = match outcome {
            UpsertResult::Created { record } => {
                info!("Created record {} (ipv4: {:?}, ipv6: {:?})", hostname, record.ipv4, record.ipv6);
                EngineEvent::RecordCreated {
                    hostname: hostname.to_string(),
                    ipv4: record.ipv4,
                    ipv6: record.ipv6,
                }
            }
            UpsertResult::Updated { previous, record }
                if previous.ipv4 == record.ipv4
                    && previous.ipv6 == record.ipv6
                    && previous.ttl == record.ttl =>
            {
                debug!("Record {} unchanged", hostname);
                EngineEvent::RecordUnchanged {
                    hostname: hostname.to_string(),
                }
            }
            UpsertResult::Updated { previous, record } => {
                info!(
                    "Updated {} -> ipv4: {:?}, ipv6: {:?} (previous: {:?}, {:?})",
                    hostname, record.ipv4, record.ipv6, previous.ipv4, previous.ipv6
                );
                EngineEvent::RecordUpdated {
                    hostname: hostname.to_string(),
                    ipv4: record.ipv4,
                    ipv6: record.ipv6,
                    previous_ipv4: previous.ipv4,
                    previous_ipv6: previous.ipv6,
                }
            }
        };
        self.emit_event(event);
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
