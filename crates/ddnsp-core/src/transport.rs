// # Transport Metadata
//
// The engine never talks to a socket. Whatever shell hosts it (an HTTP
// server, a test harness) hands every request over as a `RequestContext`:
// the headers, the peer address and the decoded query string.
//
// `IpResolver` derives the caller's address from that metadata for
// `"auto"` updates.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use crate::config::IpResolverConfig;

/// Connection metadata for one inbound request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Headers, keyed by lowercase name
    headers: HashMap<String, String>,
    /// Address of the directly connected peer
    peer_addr: Option<IpAddr>,
    /// Decoded query parameters
    query: HashMap<String, String>,
}

impl RequestContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header (names are case-insensitive)
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the peer address
    pub fn with_peer_addr(mut self, addr: IpAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Add a query parameter
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Look up a header by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Address of the directly connected peer
    pub fn peer_addr(&self) -> Option<IpAddr> {
        self.peer_addr
    }

    /// Look up a query parameter
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Derives the caller's address from request metadata
///
/// Pure function of the request: no caching, no state beyond its
/// configuration.
#[derive(Debug, Clone)]
pub struct IpResolver {
    config: IpResolverConfig,
}

impl IpResolver {
    /// Create a resolver
    pub fn new(config: IpResolverConfig) -> Self {
        Self { config }
    }

    /// Resolve the client address for a request
    ///
    /// Prefers the first entry of the forwarded-address header, then the
    /// peer address. IPv6 loopback and IPv4-mapped forms are normalized to
    /// their IPv4 equivalents. Falls back to `127.0.0.1` when the request
    /// carries no usable address at all.
    pub fn resolve_client_address(&self, ctx: &RequestContext) -> IpAddr {
        let forwarded = if self.config.trust_forwarded_for {
            ctx.header(&self.config.forwarded_header)
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .and_then(|first| first.parse::<IpAddr>().ok())
        } else {
            None
        };

        let addr = forwarded
            .or_else(|| ctx.peer_addr())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        normalize(addr)
    }
}

impl Default for IpResolver {
    fn default() -> Self {
        Self::new(IpResolverConfig::default())
    }
}

fn normalize(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) if v6.is_loopback() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}
