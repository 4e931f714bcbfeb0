//! Version manager configuration

use crate::error::{VersionError, VersionResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings consumed by [`VersionManager`](crate::VersionManager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Root directory holding one snapshot directory per resource-kind
    pub versions_storage_path: PathBuf,
    /// Snapshots retained per resource-kind
    pub max_versions_to_keep: usize,
}

impl VersionConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With storage root
    #[inline]
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.versions_storage_path = path.into();
        self
    }

    /// With retention count
    #[inline]
    #[must_use]
    pub fn with_max_versions(mut self, max: usize) -> Self {
        self.max_versions_to_keep = max;
        self
    }

    /// Check retention keeps at least the current version
    ///
    /// # Errors
    /// `VersionError::InvalidConfig` when `max_versions_to_keep` is zero.
    pub fn validate(&self) -> VersionResult<()> {
        if self.max_versions_to_keep == 0 {
            return Err(VersionError::InvalidConfig(
                "max_versions_to_keep must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            versions_storage_path: PathBuf::from("./versions"),
            max_versions_to_keep: 10,
        }
    }
}
