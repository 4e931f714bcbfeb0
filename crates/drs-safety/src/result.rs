//! Safety verdicts

use chrono::NaiveDateTime;
use drs_store::format_iso;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Structured diagnostic payload attached to a verdict
pub type Details = Map<String, Value>;

/// Outcome of a safety evaluation
///
/// Always carries a reason, even when safe. Fields are private so a verdict
/// cannot be flipped after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyCheckResult {
    is_safe: bool,
    reason: String,
    details: Details,
    timestamp: String,
}

impl SafetyCheckResult {
    /// Create verdict stamped with `at`
    #[must_use]
    pub fn new(is_safe: bool, reason: impl Into<String>, details: Details, at: NaiveDateTime) -> Self {
        Self {
            is_safe,
            reason: reason.into(),
            details,
            timestamp: format_iso(at),
        }
    }

    /// Whether the caller may proceed
    #[inline]
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    /// Human-readable explanation
    #[inline]
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Diagnostic payload
    #[inline]
    #[must_use]
    pub fn details(&self) -> &Details {
        &self.details
    }

    /// Single diagnostic value
    #[inline]
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    /// ISO-8601 construction time
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Consume into reason and details (for error conversion)
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (String, Details) {
        (self.reason, self.details)
    }
}

impl fmt::Display for SafetyCheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.is_safe { "SAFE" } else { "BLOCKED" };
        write!(f, "[{verdict}] {}", self.reason)
    }
}

/// Diagnostic classification of an allowed mass deletion
///
/// Never affects the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationScenario {
    /// Source and target counts within 2x of each other
    NormalSync,
    /// Source much larger than target
    InitialSyncOrUpdate,
    /// Source much smaller, but not a trend collapse
    PartialSync,
    /// Target is empty
    InitialDeployment,
    /// None of the above (e.g. source empty, small target)
    Unknown,
}

impl MigrationScenario {
    /// Stable label used in reasons and details
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NormalSync => "normal_sync",
            Self::InitialSyncOrUpdate => "initial_sync_or_update",
            Self::PartialSync => "partial_sync",
            Self::InitialDeployment => "initial_deployment",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MigrationScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn accessors_and_display() {
        let mut details = Details::new();
        details.insert("current_count".into(), json!(0));
        let result = SafetyCheckResult::new(false, "zero after nonzero", details, at());

        assert!(!result.is_safe());
        assert_eq!(result.reason(), "zero after nonzero");
        assert_eq!(result.detail("current_count"), Some(&json!(0)));
        assert_eq!(result.timestamp(), "2026-10-17T08:00:00.000000");
        assert_eq!(result.to_string(), "[BLOCKED] zero after nonzero");
    }

    #[test]
    fn scenario_serializes_snake_case() {
        let value = serde_json::to_value(MigrationScenario::InitialSyncOrUpdate).unwrap();
        assert_eq!(value, json!("initial_sync_or_update"));
        assert_eq!(MigrationScenario::NormalSync.to_string(), "normal_sync");
    }
}
