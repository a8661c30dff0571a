//! Configuration types for the update engine
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Tokens seeded into the in-memory token registry
    #[serde(default)]
    pub tokens: Vec<String>,

    /// Caller address detection
    #[serde(default)]
    pub ip_resolver: IpResolverConfig,

    /// Credential extraction
    #[serde(default)]
    pub auth: AuthConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            ip_resolver: IpResolverConfig::default(),
            auth: AuthConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Set the seed tokens
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(crate::Error::config("Tokens cannot be empty strings"));
        }

        self.ip_resolver.validate()?;
        self.auth.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller address detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpResolverConfig {
    /// Whether the forwarded-address header is honoured
    ///
    /// Only disable this when the engine is reachable without a reverse
    /// proxy in front of it; otherwise every caller resolves to the proxy.
    #[serde(default = "default_trust_forwarded_for")]
    pub trust_forwarded_for: bool,

    /// Name of the forwarded-address header (case-insensitive)
    #[serde(default = "default_forwarded_header")]
    pub forwarded_header: String,
}

impl IpResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.trust_forwarded_for && self.forwarded_header.trim().is_empty() {
            return Err(crate::Error::config(
                "Forwarded header name cannot be empty when trust_forwarded_for is set",
            ));
        }
        Ok(())
    }
}

impl Default for IpResolverConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_for: default_trust_forwarded_for(),
            forwarded_header: default_forwarded_header(),
        }
    }
}

/// Credential extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header carrying a bare API key, accepted as an alternative to a bearer token
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
}

impl AuthConfig {
    /// Validate the auth configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key_header.trim().is_empty() {
            return Err(crate::Error::config("API key header name cannot be empty"));
        }
        if self.api_key_header.eq_ignore_ascii_case("authorization") {
            return Err(crate::Error::config(
                "API key header cannot be the Authorization header",
            ));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_header: default_api_key_header(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// TTL reported for TXT records added without one
    #[serde(default = "default_txt_ttl")]
    pub txt_default_ttl: u32,

    /// Maximum number of comma-separated hostnames in one legacy request
    ///
    /// Requests above this are answered with `abuse`.
    #[serde(default = "default_legacy_max_hostnames")]
    pub legacy_max_hostnames: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        crate::validation::Ttl::new(i64::from(self.txt_default_ttl))
            .map_err(|e| crate::Error::config(format!("txt_default_ttl: {}", e)))?;
        if self.legacy_max_hostnames == 0 {
            return Err(crate::Error::config("legacy_max_hostnames must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            txt_default_ttl: default_txt_ttl(),
            legacy_max_hostnames: default_legacy_max_hostnames(),
        }
    }
}

fn default_trust_forwarded_for() -> bool {
    true
}

fn default_forwarded_header() -> String {
    "x-forwarded-for".to_string()
}

fn default_api_key_header() -> String {
    "x-api-key".to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_txt_ttl() -> u32 {
    60
}

fn default_legacy_max_hostnames() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DdnsConfig::new().with_tokens(["test_token_123"]);
        assert!(config.validate().is_ok());
        assert!(config.ip_resolver.trust_forwarded_for);
        assert_eq!(config.ip_resolver.forwarded_header, "x-forwarded-for");
        assert_eq!(config.auth.api_key_header, "x-api-key");
        assert_eq!(config.engine.txt_default_ttl, 60);
    }

    #[test]
    fn rejects_blank_tokens_and_zero_capacity() {
        let config = DdnsConfig::new().with_tokens(["  "]);
        assert!(config.validate().is_err());

        let mut config = DdnsConfig::new();
        config.engine.event_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_txt_ttl() {
        let mut config = DdnsConfig::new();
        config.engine.txt_default_ttl = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DdnsConfig =
            serde_json::from_str(r#"{"tokens": ["a"], "engine": {"legacy_max_hostnames": 5}}"#)
                .unwrap();
        assert_eq!(config.tokens, vec!["a".to_string()]);
        assert_eq!(config.engine.legacy_max_hostnames, 5);
        assert_eq!(config.engine.event_channel_capacity, 1000);
        assert_eq!(config.auth.api_key_header, "x-api-key");
    }
}
