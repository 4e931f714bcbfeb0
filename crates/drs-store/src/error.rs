//! Error types for the store primitives

use std::path::{Path, PathBuf};

/// Errors raised while reading or writing store files
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error on a store path
    #[error("io error on {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// File content is not the expected JSON document
    #[error("invalid json in {path}: {source}")]
    Json {
        /// File that failed to decode or encode
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Temp file could not be moved over its destination
    #[error("failed to persist {path}: {source}")]
    Persist {
        /// Destination path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Resource-kind cannot be used as a directory name
    #[error("invalid resource kind {kind:?} under {path}")]
    InvalidKind {
        /// Rejected resource-kind
        kind: String,
        /// Storage root it was to be joined onto
        path: PathBuf,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create JSON error for path
    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Path the failing operation was working on
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Json { path, .. }
            | Self::Persist { path, .. }
            | Self::InvalidKind { path, .. } => path,
        }
    }

    /// Whether the file existed but could not be decoded
    #[inline]
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Json { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
