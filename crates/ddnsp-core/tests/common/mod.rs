//! Test doubles and common utilities for contract tests
//!
//! Provides an engine constructor, request-context builders and a record
//! store double that counts writes and can be told to fail.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ddnsp_core::traits::{DomainRecord, RecordPatch, RecordStore, UpsertResult};
use ddnsp_core::{
    DdnsConfig, EngineEvent, Error, MemoryRecordStore, MemoryTokenRegistry, MemoryTxtStore,
    RequestContext, UpdateEngine,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Token registered in every test engine
pub const TOKEN: &str = "test_token_123";

/// A RecordStore that wraps the memory store and counts calls
#[derive(Debug, Clone, Default)]
pub struct CountingRecordStore {
    inner: MemoryRecordStore,
    upserts: Arc<AtomicUsize>,
    fail_upserts: Arc<AtomicBool>,
}

impl CountingRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of upsert calls that reached the store
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Make every following upsert fail with a store error
    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl RecordStore for CountingRecordStore {
    async fn upsert(&self, hostname: &str, patch: RecordPatch) -> Result<UpsertResult, Error> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(Error::store("backend unavailable"));
        }
        self.inner.upsert(hostname, patch).await
    }

    async fn get(&self, hostname: &str) -> Result<DomainRecord, Error> {
        self.inner.get(hostname).await
    }

    async fn list(&self) -> Result<Vec<(String, DomainRecord)>, Error> {
        self.inner.list().await
    }

    async fn delete(&self, hostname: &str) -> Result<bool, Error> {
        self.inner.delete(hostname).await
    }

    async fn flush(&self) -> Result<(), Error> {
        self.inner.flush().await
    }
}

/// Engine plus handles on its stores
pub struct TestEngine {
    pub engine: UpdateEngine,
    pub events: mpsc::Receiver<EngineEvent>,
    pub records: CountingRecordStore,
    pub txt: MemoryTxtStore,
}

impl TestEngine {
    /// Collect every event emitted so far
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Configuration accepting [`TOKEN`]
pub fn test_config() -> DdnsConfig {
    DdnsConfig::new().with_tokens([TOKEN])
}

/// Engine over fresh stores with [`test_config`]
pub fn test_engine() -> TestEngine {
    test_engine_with(test_config())
}

/// Engine over fresh stores with a custom configuration
pub fn test_engine_with(config: DdnsConfig) -> TestEngine {
    let records = CountingRecordStore::new();
    let txt = MemoryTxtStore::new();
    let tokens = MemoryTokenRegistry::from_tokens(config.tokens.iter().cloned());

    let (engine, events) = UpdateEngine::new(
        Arc::new(records.clone()),
        Arc::new(txt.clone()),
        Arc::new(tokens),
        config,
    )
    .expect("engine construction succeeds");

    TestEngine {
        engine,
        events,
        records,
        txt,
    }
}

/// Request from a public caller with a valid bearer token
pub fn bearer() -> RequestContext {
    caller([198, 51, 100, 7]).with_header("Authorization", format!("Bearer {}", TOKEN))
}

/// Request with basic credentials `user:token`
pub fn basic(token: &str) -> RequestContext {
    let encoded = BASE64.encode(format!("router:{}", token));
    caller([198, 51, 100, 7]).with_header("Authorization", format!("Basic {}", encoded))
}

/// Unauthenticated request from the given peer address
pub fn caller(addr: impl Into<IpAddr>) -> RequestContext {
    RequestContext::new().with_peer_addr(addr.into())
}
