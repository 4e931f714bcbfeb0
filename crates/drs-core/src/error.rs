//! Error types for migrations and rollbacks
//!
//! Unsafe verdicts from the safety gate become errors here, carrying the
//! verdict's reason and details unchanged.

use drs_safety::{ApiError, Details, ErrorClass, SafetyError};
use drs_versions::VersionError;

/// Migration and rollback failures
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// A tenant call failed
    #[error("tenant request failed: {0}")]
    Fetch(#[from] ApiError),

    /// The source fetch was judged untrustworthy
    #[error("Safety check failed: {reason}")]
    UnsafeFetch {
        /// Verdict reason
        reason: String,
        /// Verdict details
        details: Details,
    },

    /// Deleting the target's resources was judged unsafe
    #[error("Mass deletion safety check failed: {reason}")]
    UnsafeDeletion {
        /// Verdict reason
        reason: String,
        /// Verdict details
        details: Details,
    },

    /// Resources were still present in the target after deletion
    #[error("deletion verification failed: {remaining} resources still exist in the target")]
    DeletionVerification {
        /// Target resources found after deleting
        remaining: usize,
    },

    /// The target count after creation did not match the source
    #[error("creation verification failed: expected {expected} resources, found {actual}")]
    CreationVerification {
        /// Source count minus adapter skips
        expected: usize,
        /// Target count found after creating
        actual: usize,
    },

    /// No version to roll back to
    #[error("no rollback target: {0}")]
    NoRollbackTarget(String),

    /// Safety gate could not be set up
    #[error("safety error: {0}")]
    Safety(#[from] SafetyError),

    /// Version history could not be written
    #[error("version error: {0}")]
    Version(#[from] VersionError),
}

impl MigrationError {
    /// Whether a safety gate refused to proceed
    #[inline]
    #[must_use]
    pub fn is_safety_block(&self) -> bool {
        matches!(self, Self::UnsafeFetch { .. } | Self::UnsafeDeletion { .. })
    }

    /// Whether running again later may succeed without operator action
    ///
    /// Only transient tenant failures qualify; safety blocks and
    /// verification failures need a human to look first.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(e) => matches!(e.class(), ErrorClass::ServerError)
                || e.status_code.is_none(),
            _ => false,
        }
    }

    /// Verdict details for safety blocks
    #[must_use]
    pub fn details(&self) -> Option<&Details> {
        match self {
            Self::UnsafeFetch { details, .. } | Self::UnsafeDeletion { details, .. } => Some(details),
            _ => None,
        }
    }
}

/// Result type alias for migrations
pub type MigrationResult<T> = Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_blocks_are_not_retryable() {
        let err = MigrationError::UnsafeDeletion {
            reason: "CRITICAL: TeamA count dropped to 0".to_string(),
            details: Details::new(),
        };
        assert!(err.is_safety_block());
        assert!(!err.is_retryable());
        assert!(err.details().is_some());
        assert!(err.to_string().contains("CRITICAL"));
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(MigrationError::from(ApiError::http(503, "unavailable")).is_retryable());
        assert!(MigrationError::from(ApiError::new("connection reset")).is_retryable());
        assert!(!MigrationError::from(ApiError::http(401, "unauthorized")).is_retryable());
    }

    #[test]
    fn verification_failures_need_an_operator() {
        let err = MigrationError::CreationVerification {
            expected: 10,
            actual: 9,
        };
        assert!(!err.is_safety_block());
        assert!(!err.is_retryable());
    }
}
