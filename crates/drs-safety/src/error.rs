//! Error types for the safety layer
//!
//! Safety checks themselves never fail: they always produce a
//! [`SafetyCheckResult`](crate::SafetyCheckResult). Errors here cover
//! setting the manager up and the transport errors it classifies.

use drs_store::StoreError;

/// Errors while constructing or configuring a safety manager
#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    /// Safety storage could not be prepared
    #[error("safety storage error: {0}")]
    Storage(#[from] StoreError),

    /// Thresholds would weaken or invert the safety guarantee
    #[error("invalid safety thresholds: {0}")]
    InvalidThresholds(String),
}

/// Result type alias for safety setup
pub type SafetyResult<T> = Result<T, SafetyError>;

/// Error raised by a tenant API call
///
/// Produced by the resource-kind adapters; the safety layer only looks at
/// the optional HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable message
    pub message: String,
    /// HTTP status, when the failure came from a response
    pub status_code: Option<u16>,
    /// Raw response body, when available
    pub body: Option<String>,
}

impl ApiError {
    /// Create error without a status (connect failure, timeout, decode error)
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            body: None,
        }
    }

    /// Create error for an HTTP response status
    #[inline]
    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status_code),
            body: None,
        }
    }

    /// Attach the response body
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Classify by status code
    #[inline]
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        ErrorClass::from_status(self.status_code)
    }
}

/// Anything a tenant fetch can fail with
///
/// The safety manager needs the error text, a type label for diagnostics
/// and, when there is one, an HTTP-like status code.
pub trait FetchFailure: std::error::Error {
    /// HTTP-like status code carried by the error
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// Short label identifying the kind of error in diagnostics
    fn error_type(&self) -> &'static str {
        "Error"
    }
}

impl FetchFailure for ApiError {
    fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    fn error_type(&self) -> &'static str {
        "ApiError"
    }
}

impl FetchFailure for std::io::Error {
    fn error_type(&self) -> &'static str {
        "IoError"
    }
}

/// Transport error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// 401 / 403
    Authentication,
    /// 404
    NotFound,
    /// 500 / 502 / 503 / 504
    ServerError,
    /// Any other status, or none
    Generic,
}

impl ErrorClass {
    /// Classify an optional status code
    #[must_use]
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(401 | 403) => Self::Authentication,
            Some(404) => Self::NotFound,
            Some(500 | 502 | 503 | 504) => Self::ServerError,
            _ => Self::Generic,
        }
    }
}
