//! Error types for the version layer
//!
//! Only write paths fail. Lookups and listings degrade to "not found" or
//! skip the unreadable entry.

use drs_store::StoreError;

/// Version persistence errors
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// Snapshot file could not be written
    #[error("failed to write snapshot {version_id}: {source}")]
    SnapshotWrite {
        /// Id of the snapshot being written
        version_id: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Current/previous pointers could not be updated
    #[error("failed to update version pointers to {version_id}: {source}")]
    PointerUpdate {
        /// Id the current pointer was to be moved to
        version_id: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Storage directory could not be prepared
    #[error("version storage error: {0}")]
    Storage(#[from] StoreError),

    /// Invalid configuration value
    #[error("invalid version configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for version operations
pub type VersionResult<T> = Result<T, VersionError>;
