// # Bulk Updates
//
// Runs the single-hostname pipeline over a bounded batch. Admission
// (credentials, request shape, item cap) is decided once, before any
// item touches the store. After that every item runs to completion on
// its own; one failure never rolls back or skips another item.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use tracing::{info, warn};

use super::{EngineEvent, UpdateEngine, UpdateRequest};
use crate::error::{Error, Result};
use crate::transport::RequestContext;
use crate::validation::BULK_LIMIT;

/// Body of a bulk update request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub updates: Option<Vec<BulkItem>>,
}

impl BulkUpdateRequest {
    pub fn new(updates: Vec<UpdateRequest>) -> Self {
        Self {
            updates: Some(updates.into_iter().map(BulkItem::Update).collect()),
        }
    }
}

/// One entry of a bulk batch
///
/// An entry that does not decode as an [`UpdateRequest`] (wrong field
/// types, not an object) is kept as raw JSON and fails on its own with
/// `validation_error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulkItem {
    Update(UpdateRequest),
    Malformed(serde_json::Value),
}

impl From<UpdateRequest> for BulkItem {
    fn from(request: UpdateRequest) -> Self {
        BulkItem::Update(request)
    }
}

impl BulkItem {
    /// Hostname as supplied, if it is a string
    fn hostname(&self) -> Option<&str> {
        match self {
            BulkItem::Update(request) => request.hostname.as_deref(),
            BulkItem::Malformed(value) => value.get("hostname").and_then(serde_json::Value::as_str),
        }
    }
}

/// Outcome of one batch item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub hostname: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<Ipv4Addr>,
    /// Error code of a failed item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counts over a whole batch; `total == successful + failed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Aggregate class of a processed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    /// No item failed
    Success,
    /// Some items failed, some succeeded
    PartialSuccess,
    /// Every item failed
    Failure,
}

impl BulkOutcome {
    /// Transport status for this outcome
    pub fn http_status(self) -> u16 {
        match self {
            BulkOutcome::Success => 200,
            BulkOutcome::PartialSuccess => 207,
            BulkOutcome::Failure => 400,
        }
    }
}

/// Result of a processed batch, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub summary: BulkSummary,
    pub results: Vec<BulkResult>,
}

impl BulkUpdateResponse {
    fn from_results(results: Vec<BulkResult>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        let summary = BulkSummary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        };
        Self { summary, results }
    }

    /// Aggregate outcome class
    ///
    /// An empty batch counts as a success.
    pub fn outcome(&self) -> BulkOutcome {
        match (self.summary.successful, self.summary.failed) {
            (_, 0) => BulkOutcome::Success,
            (0, _) => BulkOutcome::Failure,
            _ => BulkOutcome::PartialSuccess,
        }
    }
}

impl UpdateEngine {
    /// Update up to [`BULK_LIMIT`] hostnames
    ///
    /// # Errors
    ///
    /// Only request-wide problems are errors: `unauthorized`,
    /// `validation_error` (no `updates` array) and `bulk_limit_exceeded`.
    /// In each case no item is processed. Per-item failures are reported
    /// in [`BulkUpdateResponse::results`].
    pub async fn bulk_update(
        &self,
        ctx: &RequestContext,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse> {
        self.authorize(ctx, "bulk_update")?;

        let updates = request
            .updates
            .as_deref()
            .ok_or_else(|| Error::validation("updates array is required"))?;

        if updates.len() > BULK_LIMIT {
            warn!("Rejected bulk update of {} items (limit {})", updates.len(), BULK_LIMIT);
            return Err(Error::BulkLimitExceeded {
                count: updates.len(),
                limit: BULK_LIMIT,
            });
        }

        let mut results = Vec::with_capacity(updates.len());
        for item in updates {
            let outcome = match item {
                BulkItem::Update(request) => self.apply_update(ctx, request).await,
                BulkItem::Malformed(_) => Err(Error::validation("update entry has invalid field types")),
            };
            let result = match outcome {
                Ok(record) => BulkResult {
                    hostname: Some(record.hostname),
                    success: true,
                    ipv4: record.ipv4,
                    error: None,
                },
                Err(e) => {
                    warn!("Bulk item {:?} failed: {}", item.hostname(), e);
                    BulkResult {
                        hostname: item.hostname().map(str::to_string),
                        success: false,
                        ipv4: None,
                        error: Some(e.code().to_string()),
                    }
                }
            };
            results.push(result);
        }

        let response = BulkUpdateResponse::from_results(results);
        let BulkSummary {
            total,
            successful,
            failed,
        } = response.summary;
        info!("Bulk update finished: {} total, {} ok, {} failed", total, successful, failed);
        self.emit_event(EngineEvent::BulkCompleted {
            total,
            successful,
            failed,
        });

        Ok(response)
    }
}
