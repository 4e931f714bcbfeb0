//! Safety manager configuration

use crate::thresholds::SafetyThresholds;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings consumed by [`SafetyManager`](crate::SafetyManager)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Root directory holding one ledger directory per resource-kind
    pub safety_storage_path: PathBuf,
    /// Minimum resources expected from the source (reserved, not enforced)
    pub min_resources_threshold: usize,
    /// Window in which zero results count as "recent"
    pub max_zero_results_window_hours: u32,
    /// Gate thresholds
    pub thresholds: SafetyThresholds,
}

impl SafetyConfig {
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
        self.safety_storage_path = path.into();
        self
    }

    /// With zero-result window
    #[inline]
    #[must_use]
    pub fn with_zero_results_window_hours(mut self, hours: u32) -> Self {
        self.max_zero_results_window_hours = hours;
        self
    }

    /// With thresholds
    #[inline]
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: SafetyThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            safety_storage_path: PathBuf::from("./safety"),
            min_resources_threshold: 1,
            max_zero_results_window_hours: 24,
            thresholds: SafetyThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SafetyConfig::new();
        assert_eq!(config.safety_storage_path, PathBuf::from("./safety"));
        assert_eq!(config.min_resources_threshold, 1);
        assert_eq!(config.max_zero_results_window_hours, 24);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: SafetyConfig =
            serde_json::from_str(r#"{"max_zero_results_window_hours": 6}"#).unwrap();
        assert_eq!(config.max_zero_results_window_hours, 6);
        assert_eq!(config.safety_storage_path, PathBuf::from("./safety"));
        assert_eq!(config.thresholds, SafetyThresholds::default());
    }
}
