//! Token registry
//!
//! The engine only ever asks one question of the token registry: is this
//! token a member? Issuance, rotation and storage belong to whatever
//! implements [`TokenRegistry`].
//!
//! ## Usage
//!
//! ```rust
//! use ddnsp_core::registry::{MemoryTokenRegistry, TokenRegistry};
//!
//! let registry = MemoryTokenRegistry::from_tokens(["test_token_123"]);
//! assert!(registry.contains("test_token_123"));
//! assert!(!registry.contains("nope"));
//! ```

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Membership check against the set of valid tokens
///
/// Implementations must be thread-safe; the engine calls `contains` from
/// many tasks at once.
pub trait TokenRegistry: Send + Sync {
    /// Whether `token` is a currently valid credential
    fn contains(&self, token: &str) -> bool;
}

/// In-memory token registry
///
/// Holds a plain set of tokens behind an `RwLock`, allowing concurrent
/// membership checks and exclusive registration/revocation.
#[derive(Debug, Default)]
pub struct MemoryTokenRegistry {
    tokens: RwLock<HashSet<String>>,
}

impl MemoryTokenRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with `tokens`
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: RwLock::new(tokens.into_iter().map(Into::into).collect()),
        }
    }

    /// Register a token
    ///
    /// Returns `true` if the token was not already present.
    pub fn register(&self, token: impl Into<String>) -> bool {
        self.write().insert(token.into())
    }

    /// Revoke a token
    ///
    /// Returns `true` if the token was present.
    pub fn revoke(&self, token: &str) -> bool {
        self.write().remove(token)
    }

    /// Number of registered tokens
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave a HashSet half-written,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.tokens.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.tokens.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenRegistry for MemoryTokenRegistry {
    fn contains(&self, token: &str) -> bool {
        self.read().contains(token)
    }
}
