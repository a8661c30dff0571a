//! Error types for the update engine
//!
//! Every failure the engine can report is a variant of [`Error`]. Each
//! variant carries a stable wire code (see [`Error::code`]) so the
//! transport shell can render it without matching on messages.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the update engine
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or rejected credentials
    #[error("Authentication required")]
    Unauthorized,

    /// Structurally invalid request (missing required field, wrong shape)
    #[error("{0}")]
    Validation(String),

    /// Hostname failed the hostname rules
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    /// Malformed address, or an address inside private space
    #[error("Invalid IP address: {0}")]
    InvalidIp(String),

    /// TTL outside the accepted bounds
    #[error("TTL must be between 60 and 86400, got {0}")]
    InvalidTtl(i64),

    /// Bulk batch larger than the admission cap
    #[error("Maximum {limit} updates per request, got {count}")]
    BulkLimitExceeded {
        /// Number of items submitted
        count: usize,
        /// Admission cap
        limit: usize,
    },

    /// TXT add without a value
    #[error("value is required")]
    TxtValueRequired,

    /// TXT value longer than a single character-string
    #[error("TXT value exceeds 255 characters (got {0})")]
    TxtValueTooLong(usize),

    /// TXT hostname missing or malformed
    #[error("Invalid TXT record name: {0}")]
    TxtInvalidName(String),

    /// Record not found
    #[error("Hostname not found: {0}")]
    NotFound(String),

    /// Record or TXT store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid hostname error
    pub fn invalid_hostname(msg: impl Into<String>) -> Self {
        Self::InvalidHostname(msg.into())
    }

    /// Create an invalid IP error
    pub fn invalid_ip(msg: impl Into<String>) -> Self {
        Self::InvalidIp(msg.into())
    }

    /// Create an invalid TXT name error
    pub fn txt_invalid_name(msg: impl Into<String>) -> Self {
        Self::TxtInvalidName(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized => "unauthorized",
            Error::Validation(_) => "validation_error",
            Error::InvalidHostname(_) => "invalid_hostname",
            Error::InvalidIp(_) => "invalid_ip",
            Error::InvalidTtl(_) => "invalid_ttl",
            Error::BulkLimitExceeded { .. } => "bulk_limit_exceeded",
            Error::TxtValueRequired => "txt_value_required",
            Error::TxtValueTooLong(_) => "txt_value_too_long",
            Error::TxtInvalidName(_) => "txt_invalid_name",
            Error::NotFound(_) => "not_found",
            Error::Store(_) | Error::Config(_) | Error::Json(_) | Error::Other(_) => {
                "internal_error"
            }
        }
    }

    /// Transport status class the modern endpoints report for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Unauthorized => 401,
            Error::NotFound(_) => 404,
            Error::Validation(_)
            | Error::InvalidHostname(_)
            | Error::InvalidIp(_)
            | Error::InvalidTtl(_)
            | Error::BulkLimitExceeded { .. }
            | Error::TxtValueRequired
            | Error::TxtValueTooLong(_)
            | Error::TxtInvalidName(_) => 400,
            Error::Store(_) | Error::Config(_) | Error::Json(_) | Error::Other(_) => 500,
        }
    }

    /// Whether the error was caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Structured `{code, message}` body for this error
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Wire form of an error: `{"code": ..., "message": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable error code
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_vocabulary() {
        assert_eq!(Error::Unauthorized.code(), "unauthorized");
        assert_eq!(Error::validation("x").code(), "validation_error");
        assert_eq!(Error::invalid_hostname("a..b").code(), "invalid_hostname");
        assert_eq!(Error::invalid_ip("x").code(), "invalid_ip");
        assert_eq!(Error::InvalidTtl(59).code(), "invalid_ttl");
        assert_eq!(
            Error::BulkLimitExceeded { count: 101, limit: 100 }.code(),
            "bulk_limit_exceeded"
        );
        assert_eq!(Error::TxtValueRequired.code(), "txt_value_required");
        assert_eq!(Error::TxtValueTooLong(256).code(), "txt_value_too_long");
        assert_eq!(Error::txt_invalid_name("").code(), "txt_invalid_name");
        assert_eq!(Error::not_found("h").code(), "not_found");
        assert_eq!(Error::store("boom").code(), "internal_error");
    }

    #[test]
    fn status_classes() {
        assert_eq!(Error::Unauthorized.http_status(), 401);
        assert_eq!(Error::not_found("h").http_status(), 404);
        assert_eq!(Error::InvalidTtl(0).http_status(), 400);
        assert_eq!(Error::store("boom").http_status(), 500);
        assert!(Error::TxtValueRequired.is_client_error());
        assert!(!Error::store("boom").is_client_error());
    }

    #[test]
    fn body_carries_code_and_message() {
        let body = Error::InvalidTtl(30).body();
        assert_eq!(body.code, "invalid_ttl");
        assert!(body.message.contains("30"));
    }
}
