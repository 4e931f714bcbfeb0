//! Heuristic thresholds
//!
//! The fetch gate must stay looser than the mass-deletion gate: a drop the
//! fetch check lets through has to still be caught before deleting.

use crate::error::{SafetyError, SafetyResult};
use serde::{Deserialize, Serialize};

/// Tunable limits for both safety gates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyThresholds {
    /// Source drop (percent) above which a fetch is not trusted
    pub fetch_drop_percent: f64,
    /// Source drop (percent) above which a mass deletion is blocked
    pub mass_deletion_drop_percent: f64,
    /// Recent zero results that escalate to "repeated"
    pub repeated_zero_limit: usize,
    /// Target size above which an empty source blocks deletion
    pub suspicious_target_size: usize,
    /// Lower bound of the source/target ratio considered a normal sync
    pub normal_ratio_min: f64,
    /// Upper bound of the source/target ratio considered a normal sync
    pub normal_ratio_max: f64,
}

impl SafetyThresholds {
    /// Default thresholds
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With fetch drop threshold
    #[inline]
    #[must_use]
    pub fn with_fetch_drop_percent(mut self, percent: f64) -> Self {
        self.fetch_drop_percent = percent;
        self
    }

    /// With mass-deletion drop threshold
    #[inline]
    #[must_use]
    pub fn with_mass_deletion_drop_percent(mut self, percent: f64) -> Self {
        self.mass_deletion_drop_percent = percent;
        self
    }

    /// With repeated zero-result limit
    #[inline]
    #[must_use]
    pub fn with_repeated_zero_limit(mut self, limit: usize) -> Self {
        self.repeated_zero_limit = limit;
        self
    }

    /// Check the ordering constraints between thresholds
    ///
    /// # Errors
    /// `SafetyError::InvalidThresholds` when a percentage is outside
    /// `0..=100`, the fetch threshold is not strictly below the
    /// mass-deletion threshold, the ratio band is empty, or the repeated
    /// zero limit is zero.
    pub fn validate(&self) -> SafetyResult<()> {
        for (name, value) in [
            ("fetch_drop_percent", self.fetch_drop_percent),
            ("mass_deletion_drop_percent", self.mass_deletion_drop_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(SafetyError::InvalidThresholds(format!(
                    "{name} must be within 0..=100, got {value}"
                )));
            }
        }
        if self.fetch_drop_percent >= self.mass_deletion_drop_percent {
            return Err(SafetyError::InvalidThresholds(format!(
                "fetch_drop_percent ({}) must be below mass_deletion_drop_percent ({})",
                self.fetch_drop_percent, self.mass_deletion_drop_percent
            )));
        }
        if !(self.normal_ratio_min > 0.0 && self.normal_ratio_min <= self.normal_ratio_max) {
            return Err(SafetyError::InvalidThresholds(format!(
                "normal ratio band {}..={} is empty",
                self.normal_ratio_min, self.normal_ratio_max
            )));
        }
        if self.repeated_zero_limit == 0 {
            return Err(SafetyError::InvalidThresholds(
                "repeated_zero_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            fetch_drop_percent: 50.0,
            mass_deletion_drop_percent: 70.0,
            repeated_zero_limit: 3,
            suspicious_target_size: 10,
            normal_ratio_min: 0.5,
            normal_ratio_max: 2.0,
        }
    }
}

/// Percentage drop from `previous` to `current` (negative for growth)
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn drop_percentage(previous: usize, current: usize) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    (previous as f64 - current as f64) * 100.0 / previous as f64
}
