// # Record Updates
//
// Single-hostname update pipeline plus the read-only status and listing
// operations. The pipeline short-circuits on the first failure and
// validates everything before the store is touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

use super::UpdateEngine;
use crate::error::{Error, Result};
use crate::traits::{DomainRecord, RecordPatch};
use crate::transport::RequestContext;
use crate::validation::{self, AddressInput, Ttl};

/// Body of an update request
///
/// Address fields take a literal or `"auto"`. `ip` is accepted as an alias
/// for `ipv4`; empty strings count as omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl UpdateRequest {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            ..Self::default()
        }
    }

    pub fn with_ipv4(mut self, ipv4: impl Into<String>) -> Self {
        self.ipv4 = Some(ipv4.into());
        self
    }

    pub fn with_ipv6(mut self, ipv6: impl Into<String>) -> Self {
        self.ipv6 = Some(ipv6.into());
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// IPv4 input after alias and empty-string handling
    fn ipv4_input(&self) -> Option<&str> {
        non_empty(self.ipv4.as_deref()).or_else(|| non_empty(self.ip.as_deref()))
    }
}

/// Stored state of one hostname, as returned by update and status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub hostname: String,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub ttl: Ttl,
    pub updated_at: DateTime<Utc>,
}

impl RecordResponse {
    fn new(hostname: impl Into<String>, record: &DomainRecord) -> Self {
        Self {
            hostname: hostname.into(),
            ipv4: record.ipv4,
            ipv6: record.ipv6,
            ttl: record.ttl,
            updated_at: record.updated_at,
        }
    }
}

/// Every stored hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainsResponse {
    pub domains: Vec<RecordResponse>,
    pub total: usize,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl UpdateEngine {
    /// Update one hostname
    ///
    /// # Errors
    ///
    /// - `unauthorized`: missing or unknown credentials
    /// - `validation_error`: no hostname
    /// - `invalid_hostname`, `invalid_ip`, `invalid_ttl`: field checks
    ///
    /// Nothing is written unless every check passes.
    pub async fn update(&self, ctx: &RequestContext, request: &UpdateRequest) -> Result<RecordResponse> {
        self.authorize(ctx, "update")?;
        self.apply_update(ctx, request).await
    }

    /// Validate, resolve and upsert; shared by single and bulk updates
    pub(super) async fn apply_update(
        &self,
        ctx: &RequestContext,
        request: &UpdateRequest,
    ) -> Result<RecordResponse> {
        let hostname = non_empty(request.hostname.as_deref())
            .ok_or_else(|| Error::validation("hostname is required"))?;
        validation::hostname(hostname)?;

        let ipv4 = request
            .ipv4_input()
            .map(validation::public_ipv4)
            .transpose()?;
        let ttl = validation::ttl(request.ttl, Ttl::default())?;
        let ipv6 = non_empty(request.ipv6.as_deref())
            .map(validation::ipv6)
            .transpose()?;

        let patch = RecordPatch {
            ipv4: self.resolve_ipv4(ctx, ipv4),
            ipv6: resolve_ipv6(ipv6),
            ttl: Some(ttl),
        };

        let outcome = self.records.upsert(hostname, patch).await?;
        self.emit_upsert_event(hostname, &outcome);

        Ok(RecordResponse::new(hostname, outcome.record()))
    }

    fn resolve_ipv4(&self, ctx: &RequestContext, input: Option<AddressInput<Ipv4Addr>>) -> Option<Ipv4Addr> {
        match input? {
            AddressInput::Literal(ip) => Some(ip),
            AddressInput::Auto => match self.ip_resolver.resolve_client_address(ctx) {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(ip) => {
                    // Keep the stored value rather than writing a v6 address into the A field.
                    debug!("Caller address {} is IPv6, ipv4 auto left unchanged", ip);
                    None
                }
            },
        }
    }

    /// Look up one hostname
    pub async fn status(&self, ctx: &RequestContext, hostname: &str) -> Result<RecordResponse> {
        self.authorize(ctx, "status")?;
        let record = self.records.get(hostname).await?;
        Ok(RecordResponse::new(hostname, &record))
    }

    /// List every stored hostname, sorted
    pub async fn domains(&self, ctx: &RequestContext) -> Result<DomainsResponse> {
        self.authorize(ctx, "domains")?;

        let mut domains: Vec<RecordResponse> = self
            .records
            .list()
            .await?
            .iter()
            .map(|(hostname, record)| RecordResponse::new(hostname.as_str(), record))
            .collect();
        domains.sort_by(|a, b| a.hostname.cmp(&b.hostname));

        Ok(DomainsResponse {
            total: domains.len(),
            domains,
        })
    }
}

// IPv6 auto-detection is not implemented; "auto" leaves the field as stored.
fn resolve_ipv6(input: Option<AddressInput<Ipv6Addr>>) -> Option<Ipv6Addr> {
    match input? {
        AddressInput::Literal(ip) => Some(ip),
        AddressInput::Auto => None,
    }
}
