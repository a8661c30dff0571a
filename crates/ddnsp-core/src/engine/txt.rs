// # TXT Records
//
// Challenge records accumulate: adding a second value under the same
// name keeps the first one, so wildcard validation can hold two live
// values at once. Deletion is idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{EngineEvent, UpdateEngine};
use crate::error::{Error, Result};
use crate::transport::RequestContext;
use crate::validation::{self, Ttl};

/// Body of a TXT add request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtAddRequest {
    pub hostname: Option<String>,
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl TxtAddRequest {
    pub fn new(hostname: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            value: Some(value.into()),
            ttl: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtAddResponse {
    pub hostname: String,
    pub value: String,
    pub ttl: Ttl,
    /// Number of values stored under the hostname after the add
    pub record_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Body of a TXT delete request
///
/// Without a value (or with an empty one) every value under the
/// hostname is deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtDeleteRequest {
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl TxtDeleteRequest {
    pub fn all(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            value: None,
        }
    }

    pub fn value(hostname: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtDeleteResponse {
    pub hostname: String,
    /// Always `true`; deleting something absent is not an error
    pub deleted: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtGetResponse {
    pub hostname: String,
    pub values: Vec<String>,
    pub record_count: usize,
}

fn txt_hostname(hostname: &str) -> Result<&str> {
    validation::hostname(hostname).map_err(|_| Error::txt_invalid_name(hostname))
}

impl UpdateEngine {
    /// Add a TXT value, keeping any already stored
    pub async fn txt_add(&self, ctx: &RequestContext, request: &TxtAddRequest) -> Result<TxtAddResponse> {
        self.authorize(ctx, "txt_add")?;

        let hostname = request
            .hostname
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::txt_invalid_name("hostname is required"))?;
        txt_hostname(hostname)?;
        let value = validation::txt_value(request.value.as_deref())?;
        let ttl = validation::ttl(request.ttl, self.txt_default_ttl)?;

        let record_count = self.txt.add(hostname, value).await?;
        info!("TXT {} now holds {} value(s)", hostname, record_count);
        self.emit_event(EngineEvent::TxtAdded {
            hostname: hostname.to_string(),
            record_count,
        });

        Ok(TxtAddResponse {
            hostname: hostname.to_string(),
            value: value.to_string(),
            ttl,
            record_count,
            timestamp: Utc::now(),
        })
    }

    /// Delete one TXT value, or all of them
    pub async fn txt_delete(
        &self,
        ctx: &RequestContext,
        request: &TxtDeleteRequest,
    ) -> Result<TxtDeleteResponse> {
        self.authorize(ctx, "txt_delete")?;

        let hostname = request
            .hostname
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::validation("hostname is required"))?;
        txt_hostname(hostname)?;
        let value = request.value.as_deref().filter(|v| !v.is_empty());

        self.txt.remove(hostname, value).await?;
        info!("TXT {} deleted ({})", hostname, value.unwrap_or("all values"));
        self.emit_event(EngineEvent::TxtDeleted {
            hostname: hostname.to_string(),
            value: value.map(str::to_string),
        });

        Ok(TxtDeleteResponse {
            hostname: hostname.to_string(),
            deleted: true,
            timestamp: Utc::now(),
        })
    }

    /// Current TXT values for a hostname (empty when unknown)
    pub async fn txt_get(&self, ctx: &RequestContext, hostname: &str) -> Result<TxtGetResponse> {
        self.authorize(ctx, "txt_get")?;
        txt_hostname(hostname)?;

        let values = self.txt.get(hostname).await?;
        Ok(TxtGetResponse {
            hostname: hostname.to_string(),
            record_count: values.len(),
            values,
        })
    }
}
