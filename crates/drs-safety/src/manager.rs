//! Safety Manager - the gate in front of every destructive migration
//!
//! Two decision points:
//! - **Fetch trust**: can the list just fetched from the source be believed?
//! - **Mass deletion**: may every target resource of this kind be deleted?
//!
//! Both decide from counts, count trends and error classification only;
//! resource content is never inspected. Verdicts are returned, never raised:
//! converting an unsafe verdict into an abort is the caller's job.

use crate::config::SafetyConfig;
use crate::error::{ErrorClass, FetchFailure, SafetyResult};
use crate::ledger::ZeroResultLedger;
use crate::result::{Details, MigrationScenario, SafetyCheckResult};
use crate::thresholds::{drop_percentage, SafetyThresholds};
use drs_store::{kind_dir, Resource, SharedClock, SystemClock};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Per-resource-kind safety gate
#[derive(Debug, Clone)]
pub struct SafetyManager {
    kind: String,
    dir: PathBuf,
    thresholds: SafetyThresholds,
    ledger: ZeroResultLedger,
    clock: SharedClock,
}

impl SafetyManager {
    /// Create manager for `kind`, preparing `<safety_storage_path>/<kind>/`
    ///
    /// # Errors
    /// - `SafetyError::InvalidThresholds` if the configured thresholds
    ///   would invert the gate ordering
    /// - `SafetyError::Storage` if `kind` is not a plain directory name or
    ///   the directory cannot be created
    pub fn new(config: &SafetyConfig, kind: impl Into<String>) -> SafetyResult<Self> {
        Self::with_clock(config, kind, SystemClock::shared())
    }

    /// Create manager reading time from `clock`
    ///
    /// # Errors
    /// Same as [`SafetyManager::new`].
    pub fn with_clock(
        config: &SafetyConfig,
        kind: impl Into<String>,
        clock: SharedClock,
    ) -> SafetyResult<Self> {
        config.thresholds.validate()?;

        let kind = kind.into();
        let dir = kind_dir(&config.safety_storage_path, &kind)?;

        let ledger = ZeroResultLedger::new(&dir, config.max_zero_results_window_hours, clock.clone());
        Ok(Self {
            kind,
            dir,
            thresholds: config.thresholds,
            ledger,
            clock,
        })
    }

    /// Resource-kind this manager guards
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Per-kind safety directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Active thresholds
    #[inline]
    #[must_use]
    pub fn thresholds(&self) -> &SafetyThresholds {
        &self.thresholds
    }

    /// Zero results recorded inside the configured window
    #[inline]
    #[must_use]
    pub fn recent_zero_results(&self) -> usize {
        self.ledger.recent_count()
    }

    /// Decide whether a source fetch can be trusted
    ///
    /// # Arguments
    /// * `current_resources` - what the source returned (possibly empty)
    /// * `fetch_error` - the error raised by the fetch, if any
    /// * `previous_count` - source count from the current version, `None`
    ///   on a first run
    ///
    /// An error always yields an unsafe verdict. An empty fetch after a
    /// nonzero history is recorded in the zero-result ledger and blocked.
    pub fn check_teama_fetch_safety(
        &self,
        current_resources: &[Resource],
        fetch_error: Option<&dyn FetchFailure>,
        previous_count: Option<usize>,
    ) -> SafetyCheckResult {
        let current_count = current_resources.len();

        let result = if let Some(error) = fetch_error {
            self.fetch_error_verdict(error, current_count, previous_count)
        } else if current_count == 0 {
            self.zero_result_verdict(previous_count)
        } else {
            self.fetch_trend_verdict(current_count, previous_count)
        };

        if result.is_safe() {
            tracing::debug!(kind = %self.kind, current_count, "{}", result.reason());
        } else {
            tracing::warn!(kind = %self.kind, current_count, details = ?result.details(), "{}", result.reason());
        }
        result
    }

    fn fetch_error_verdict(
        &self,
        error: &dyn FetchFailure,
        current_count: usize,
        previous_count: Option<usize>,
    ) -> SafetyCheckResult {
        let status = error.status_code();
        let mut details = details(json!({
            "error_type": error.error_type(),
            "error_message": error.to_string(),
            "current_count": current_count,
            "previous_count": previous_count,
        }));
        if let Some(code) = status {
            details.insert("status_code".to_string(), json!(code));
        }

        let code = status.map_or_else(String::new, |c| c.to_string());
        let reason = match ErrorClass::from_status(status) {
            ErrorClass::Authentication => format!(
                "Authentication/Authorization error (HTTP {code}): Cannot proceed with migration as TeamA data is inaccessible"
            ),
            ErrorClass::NotFound => format!(
                "TeamA endpoint not found (HTTP {code}): API endpoint may have changed or service may be unavailable"
            ),
            ErrorClass::ServerError => format!(
                "TeamA server error (HTTP {code}): Server is experiencing issues, cannot trust zero results"
            ),
            ErrorClass::Generic => format!("TeamA fetch failed with error: {error}"),
        };
        self.blocked(reason, details)
    }

    fn zero_result_verdict(&self, previous_count: Option<usize>) -> SafetyCheckResult {
        let previous = match previous_count {
            None => {
                return self.safe(
                    "Zero results from TeamA, but no previous count available - assuming legitimate empty state",
                    details(json!({
                        "current_count": 0,
                        "previous_count": Value::Null,
                        "assumption": "legitimate_empty_state",
                    })),
                );
            }
            Some(previous) => previous,
        };

        let limit = self.thresholds.repeated_zero_limit;
        let recent_zeros = self.ledger.recent_count();
        if recent_zeros >= limit {
            return self.blocked(
                format!(
                    "Multiple consecutive zero results from TeamA ({recent_zeros} times) - likely API issue"
                ),
                details(json!({
                    "current_count": 0,
                    "previous_count": previous,
                    "recent_zero_count": recent_zeros,
                    "threshold": limit,
                })),
            );
        }

        if let Err(e) = self.ledger.record() {
            tracing::warn!(kind = %self.kind, "Failed to record zero result: {}", e);
        }

        self.blocked(
            format!(
                "TeamA returned zero resources but previously had {previous} - potential API issue"
            ),
            details(json!({
                "current_count": 0,
                "previous_count": previous,
                "recommendation": "verify_teama_manually",
            })),
        )
    }

    fn fetch_trend_verdict(&self, current_count: usize, previous_count: Option<usize>) -> SafetyCheckResult {
        if let Some(previous) = previous_count.filter(|p| *p > 0) {
            let drop = drop_percentage(previous, current_count);
            let threshold = self.thresholds.fetch_drop_percent;
            if drop > threshold {
                return self.blocked(
                    format!(
                        "Significant drop in TeamA resources: {previous} -> {current_count} ({drop:.1}% drop)"
                    ),
                    details(json!({
                        "previous_count": previous,
                        "current_count": current_count,
                        "drop_percentage": drop,
                        "threshold": threshold,
                    })),
                );
            }
        }

        self.safe(
            "TeamA fetch results are safe",
            details(json!({
                "current_count": current_count,
                "previous_count": previous_count,
                "api_error": Value::Null,
            })),
        )
    }

    /// Decide whether deleting every target resource of this kind is safe
    ///
    /// Gates on the source's own count trend, not on source-vs-target
    /// counts: partial syncs and first deployments legitimately differ.
    ///
    /// # Arguments
    /// * `resources_to_delete` - target resources queued for deletion
    /// * `total_teamb_resources` - total target resources of this kind
    /// * `teama_resource_count` - source count just fetched
    /// * `previous_teama_count` - source count captured before this run's
    ///   pre-migration snapshot
    pub fn check_mass_deletion_safety(
        &self,
        resources_to_delete: &[Resource],
        total_teamb_resources: usize,
        teama_resource_count: usize,
        previous_teama_count: Option<usize>,
    ) -> SafetyCheckResult {
        let delete_count = resources_to_delete.len();
        let result = self.mass_deletion_verdict(
            delete_count,
            total_teamb_resources,
            teama_resource_count,
            previous_teama_count,
        );

        if result.is_safe() {
            tracing::info!(kind = %self.kind, delete_count, "{}", result.reason());
        } else {
            tracing::error!(kind = %self.kind, delete_count, details = ?result.details(), "{}", result.reason());
        }
        result
    }

    fn mass_deletion_verdict(
        &self,
        delete_count: usize,
        total: usize,
        teama_count: usize,
        previous_teama_count: Option<usize>,
    ) -> SafetyCheckResult {
        if delete_count == 0 {
            return self.safe("No resources to delete", details(json!({ "delete_count": 0 })));
        }

        if let Some(previous) = previous_teama_count.filter(|p| *p > 0) {
            if teama_count == 0 {
                return self.blocked(
                    format!("CRITICAL: TeamA dropped from {previous} to 0 resources - likely API issue"),
                    details(json!({
                        "delete_count": delete_count,
                        "total_resources": total,
                        "teama_count": 0,
                        "previous_teama_count": previous,
                        "drop_percentage": 100,
                        "recommendation": "verify_teama_api_status",
                    })),
                );
            }

            let drop = drop_percentage(previous, teama_count);
            let threshold = self.thresholds.mass_deletion_drop_percent;
            if drop > threshold {
                return self.blocked(
                    format!(
                        "CRITICAL: TeamA resources dropped {drop:.1}% ({previous} → {teama_count}) - likely API issue"
                    ),
                    details(json!({
                        "delete_count": delete_count,
                        "total_resources": total,
                        "teama_count": teama_count,
                        "previous_teama_count": previous,
                        "drop_percentage": drop,
                        "threshold": threshold,
                        "recommendation": "verify_teama_api_status",
                    })),
                );
            }
        }

        if teama_count == 0 && total > self.thresholds.suspicious_target_size {
            return self.blocked(
                format!(
                    "Suspicious: TeamA has 0 resources but attempting to delete {total} from TeamB"
                ),
                details(json!({
                    "delete_count": delete_count,
                    "total_resources": total,
                    "teama_count": 0,
                    "previous_teama_count": previous_teama_count,
                    "recommendation": "verify_teama_api_status",
                })),
            );
        }

        let scenario = self.classify(teama_count, total);
        #[allow(clippy::cast_precision_loss)]
        let percentage = if total > 0 {
            delete_count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        self.safe(
            format!(
                "Safe migration: TeamA={teama_count}, TeamB={total}, Delete={delete_count} ({scenario})"
            ),
            details(json!({
                "delete_count": delete_count,
                "total_resources": total,
                "teama_count": teama_count,
                "previous_teama_count": previous_teama_count,
                "scenario_type": scenario,
                "percentage": percentage,
            })),
        )
    }

    /// Diagnostic scenario for an allowed deletion
    #[must_use]
    pub fn classify(&self, teama_count: usize, teamb_count: usize) -> MigrationScenario {
        match (teama_count, teamb_count) {
            (0, _) => MigrationScenario::Unknown,
            (_, 0) => MigrationScenario::InitialDeployment,
            (a, b) => {
                #[allow(clippy::cast_precision_loss)]
                let ratio = a as f64 / b as f64;
                if ratio > self.thresholds.normal_ratio_max {
                    MigrationScenario::InitialSyncOrUpdate
                } else if ratio >= self.thresholds.normal_ratio_min {
                    MigrationScenario::NormalSync
                } else {
                    MigrationScenario::PartialSync
                }
            }
        }
    }

    fn safe(&self, reason: impl Into<String>, details: Details) -> SafetyCheckResult {
        SafetyCheckResult::new(true, reason, details, self.clock.now())
    }

    fn blocked(&self, reason: impl Into<String>, details: Details) -> SafetyCheckResult {
        SafetyCheckResult::new(false, reason, details, self.clock.now())
    }
}

fn details(value: Value) -> Details {
    match value {
        Value::Object(map) => map,
        _ => Details::new(),
    }
}
