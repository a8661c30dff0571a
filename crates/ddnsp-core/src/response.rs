//! Modern response envelope
//!
//! Every modern endpoint answers with the same JSON shape:
//!
//! ```json
//! {"success": true, "data": { ... }}
//! {"success": false, "status": "error", "error": {"code": "invalid_ip", "message": "..."}}
//! ```
//!
//! plus a transport status the shell copies onto the wire.

use serde::Serialize;

pub use crate::engine::BulkOutcome;

use crate::engine::BulkUpdateResponse;
use crate::error::{Error, ErrorBody, Result};

/// Content type of the rendered body
pub const CONTENT_TYPE: &str = "application/json";

/// JSON envelope for the modern endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip)]
    http_status: u16,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response with status 200
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            status: None,
            data: Some(data),
            error: None,
            http_status: 200,
        }
    }

    /// Error response; the status follows the error kind
    pub fn error(err: &Error) -> Self {
        Self {
            success: false,
            status: Some("error"),
            data: None,
            error: Some(err.body()),
            http_status: err.http_status(),
        }
    }

    /// Render an engine result
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::error(&err),
        }
    }

    /// Whether the request succeeded
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Payload, if any
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Error body, if any
    pub fn error_body(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    /// Transport status for this response
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Serialize the envelope
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ApiResponse<BulkUpdateResponse> {
    /// Render a bulk result
    ///
    /// A processed batch always carries its per-item results; the
    /// envelope's `success` and status reflect the aggregate outcome
    /// (200 success, 207 partial success, 400 failure).
    pub fn bulk(result: Result<BulkUpdateResponse>) -> Self {
        match result {
            Ok(response) => {
                let outcome = response.outcome();
                Self {
                    success: outcome == BulkOutcome::Success,
                    status: None,
                    data: Some(response),
                    error: None,
                    http_status: outcome.http_status(),
                }
            }
            Err(err) => Self::error(&err),
        }
    }
}
