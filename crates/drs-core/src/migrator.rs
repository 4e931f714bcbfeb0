//! Gated delete-and-recreate migrations and rollbacks
//!
//! ```text
//! fetch A ─► fetch gate ─► fetch B ─► pre_migration ─► deletion gate ─► delete B ─► verify empty
//!                                                                          │
//!                       post_migration ◄─ verify |B| = |A| - skipped ◄─ create A
//! ```
//!
//! The baseline for both gates is the source count of the version that was
//! current when the run started.

use crate::compare::TenantComparison;
use crate::config::DrConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::report::{DryRunReport, MigrationReport, RollbackReport};
use crate::service::{CreateOutcome, ResourceService};
use drs_safety::{FetchFailure, SafetyManager};
use drs_store::{resource_identifier, Resource, SharedClock, SystemClock};
use drs_versions::{RollbackPlan, VersionManager, VersionType};

/// Counts for one batch of tenant writes
#[derive(Debug, Default, Clone, Copy)]
struct Applied {
    deleted: usize,
    created: usize,
    skipped: usize,
    failed: usize,
}

/// Runs migrations for one resource-kind
#[derive(Debug)]
pub struct Migrator<S> {
    service: S,
    safety: SafetyManager,
    versions: VersionManager,
}

impl<S: ResourceService> Migrator<S> {
    /// Create migrator with managers for `service.kind()`
    ///
    /// # Errors
    /// - `MigrationError::Safety` if the safety store or thresholds are bad
    /// - `MigrationError::Version` if the version store cannot be prepared
    pub fn new(service: S, config: &DrConfig) -> MigrationResult<Self> {
        Self::with_clock(service, config, SystemClock::shared())
    }

    /// Create migrator whose managers read time from `clock`
    ///
    /// # Errors
    /// Same as [`Migrator::new`].
    pub fn with_clock(service: S, config: &DrConfig, clock: SharedClock) -> MigrationResult<Self> {
        let kind = service.kind().to_string();
        let safety = SafetyManager::with_clock(&config.safety, kind.as_str(), clock.clone())?;
        let versions = VersionManager::with_clock(&config.versions, kind, clock)?;
        Ok(Self::from_parts(service, safety, versions))
    }

    /// Assemble from existing managers
    #[inline]
    #[must_use]
    pub fn from_parts(service: S, safety: SafetyManager, versions: VersionManager) -> Self {
        Self {
            service,
            safety,
            versions,
        }
    }

    /// Tenant adapter
    #[inline]
    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Safety gate
    #[inline]
    #[must_use]
    pub fn safety(&self) -> &SafetyManager {
        &self.safety
    }

    /// Version history
    #[inline]
    #[must_use]
    pub fn versions(&self) -> &VersionManager {
        &self.versions
    }

    fn kind(&self) -> &str {
        self.service.kind()
    }

    fn previous_teama_count(&self) -> Option<usize> {
        self.versions
            .get_current_version()
            .map(|version| version.teama_count())
    }

    /// Fetch the source and run the fetch gate against the current baseline
    ///
    /// # Errors
    /// - `MigrationError::Fetch` with the original error whenever the fetch
    ///   failed, whatever the verdict
    /// - `MigrationError::UnsafeFetch` when the fetch succeeded but cannot be
    ///   trusted
    pub fn fetch_teama_checked(&self) -> MigrationResult<Vec<Resource>> {
        let (resources, fetch_error) = match self.service.fetch_teama() {
            Ok(resources) => {
                tracing::info!(kind = %self.kind(), count = resources.len(), "Fetched resources from TeamA");
                (resources, None)
            }
            Err(e) => {
                tracing::error!(kind = %self.kind(), "Failed to fetch resources from TeamA: {}", e);
                (Vec::new(), Some(e))
            }
        };

        let verdict = self.safety.check_teama_fetch_safety(
            &resources,
            fetch_error.as_ref().map(|e| e as &dyn FetchFailure),
            self.previous_teama_count(),
        );

        if !verdict.is_safe() {
            tracing::error!(
                kind = %self.kind(),
                details = ?verdict.details(),
                "TeamA fetch safety check failed: {}",
                verdict.reason()
            );
            if let Some(e) = fetch_error {
                return Err(MigrationError::Fetch(e));
            }
            let (reason, details) = verdict.into_parts();
            return Err(MigrationError::UnsafeFetch { reason, details });
        }

        match fetch_error {
            Some(e) => Err(MigrationError::Fetch(e)),
            None => Ok(resources),
        }
    }

    /// Replace every target resource of this kind with the source's
    ///
    /// # Errors
    /// - any error of [`fetch_teama_checked`](Self::fetch_teama_checked)
    /// - `MigrationError::Fetch` if a target fetch fails
    /// - `MigrationError::Version` if the pre-migration snapshot cannot be
    ///   stored (nothing has been touched yet)
    /// - `MigrationError::UnsafeDeletion` if the deletion gate refuses
    /// - `MigrationError::DeletionVerification` /
    ///   `MigrationError::CreationVerification` if the target does not end
    ///   up in the expected state
    pub fn migrate(&self) -> MigrationResult<MigrationReport> {
        tracing::info!(kind = %self.kind(), "Starting migration");

        let teama = self.fetch_teama_checked()?;
        let teamb = self.service.fetch_teamb()?;
        tracing::info!(kind = %self.kind(), count = teamb.len(), "Fetched resources from TeamB");

        let previous_teama_count = self.previous_teama_count();
        let pre_migration_version =
            self.versions
                .create_version_snapshot(&teama, &teamb, VersionType::PRE_MIGRATION)?;

        let verdict = self.safety.check_mass_deletion_safety(
            &teamb,
            teamb.len(),
            teama.len(),
            previous_teama_count,
        );
        if !verdict.is_safe() {
            tracing::error!(
                kind = %self.kind(),
                details = ?verdict.details(),
                "Mass deletion safety check failed: {}",
                verdict.reason()
            );
            let (reason, details) = verdict.into_parts();
            return Err(MigrationError::UnsafeDeletion { reason, details });
        }

        tracing::info!(
            kind = %self.kind(),
            to_delete = teamb.len(),
            to_create = teama.len(),
            "Migration plan - delete and recreate all"
        );

        let mut applied = Applied::default();

        if teamb.is_empty() {
            tracing::info!(kind = %self.kind(), "TeamB already empty - skipping deletion");
        } else {
            self.delete_all(teamb.clone(), &mut applied);

            let remaining = self.service.fetch_teamb()?;
            if !remaining.is_empty() {
                for resource in &remaining {
                    tracing::error!(kind = %self.kind(), resource = %resource_identifier(resource), "Resource still present after deletion");
                }
                return Err(MigrationError::DeletionVerification {
                    remaining: remaining.len(),
                });
            }
            tracing::info!(kind = %self.kind(), "Deletion verification passed: TeamB is empty");
        }

        let final_teamb = if teama.is_empty() {
            tracing::info!(kind = %self.kind(), "TeamA has no resources - skipping creation");
            Vec::new()
        } else {
            self.create_all(teama.clone(), &mut applied);

            let final_teamb = self.service.fetch_teamb()?;
            let expected = teama.len().saturating_sub(applied.skipped);
            if final_teamb.len() != expected {
                tracing::error!(
                    kind = %self.kind(),
                    expected,
                    actual = final_teamb.len(),
                    skipped = applied.skipped,
                    "Creation verification failed"
                );
                return Err(MigrationError::CreationVerification {
                    expected,
                    actual: final_teamb.len(),
                });
            }
            tracing::info!(kind = %self.kind(), count = final_teamb.len(), "Creation verification passed");
            final_teamb
        };

        let post_migration_version = match self.versions.create_version_snapshot(
            &teama,
            &final_teamb,
            VersionType::POST_MIGRATION,
        ) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(kind = %self.kind(), "Failed to create post-migration snapshot: {}", e);
                None
            }
        };

        let report = MigrationReport {
            kind: self.kind().to_string(),
            teama_count: teama.len(),
            teamb_before: teamb.len(),
            teamb_after: final_teamb.len(),
            deleted: applied.deleted,
            created: applied.created,
            skipped: applied.skipped,
            failed: applied.failed,
            pre_migration_version,
            post_migration_version,
        };

        if report.is_clean() {
            tracing::info!(kind = %self.kind(), created = report.created, deleted = report.deleted, "Migration completed");
        } else {
            tracing::warn!(kind = %self.kind(), failed = report.failed, "Migration completed with errors");
        }
        Ok(report)
    }

    /// Report what [`migrate`](Self::migrate) would do, touching neither
    /// the target nor the version history
    ///
    /// The fetch gate still runs (and may record a zero result). A failing
    /// target fetch is treated as an empty target.
    ///
    /// # Errors
    /// Any error of [`fetch_teama_checked`](Self::fetch_teama_checked).
    pub fn dry_run(&self) -> MigrationResult<DryRunReport> {
        tracing::info!(kind = %self.kind(), "Starting dry run");

        let teama = self.fetch_teama_checked()?;
        let teamb = self.service.fetch_teamb().unwrap_or_else(|e| {
            tracing::warn!(kind = %self.kind(), "Failed to fetch TeamB, assuming empty: {}", e);
            Vec::new()
        });

        let comparison = TenantComparison::between(&teama, &teamb);
        let mass_deletion_check = self.safety.check_mass_deletion_safety(
            &teamb,
            teamb.len(),
            teama.len(),
            self.previous_teama_count(),
        );

        tracing::info!(
            kind = %self.kind(),
            only_in_teama = comparison.only_in_teama.len(),
            only_in_teamb = comparison.only_in_teamb.len(),
            different = comparison.different_resources.len(),
            would_proceed = mass_deletion_check.is_safe(),
            "Dry run completed"
        );

        Ok(DryRunReport {
            kind: self.kind().to_string(),
            would_delete: teamb.len(),
            would_create: teama.len(),
            comparison,
            mass_deletion_check,
        })
    }

    /// Restore the target to the state recorded in `version_id`
    ///
    /// Brackets the work with `pre_rollback` and `post_rollback` snapshots of
    /// the target. Each records the source resources its target state was
    /// synced from, so the next run's baseline survives the rollback. Individual delete/create failures are counted in the
    /// report, not raised.
    ///
    /// # Errors
    /// - `MigrationError::NoRollbackTarget` if the version cannot be loaded
    /// - `MigrationError::Fetch` if the target cannot be fetched beforehand
    /// - `MigrationError::Version` if the pre-rollback snapshot fails
    pub fn rollback_to_version(&self, version_id: &str) -> MigrationResult<RollbackReport> {
        tracing::info!(kind = %self.kind(), %version_id, "Starting rollback");

        let target = self.versions.get_version(version_id).ok_or_else(|| {
            MigrationError::NoRollbackTarget(format!("version {version_id} not found"))
        })?;
        let current = self.versions.get_current_version();
        let plan = RollbackPlan::between(&target, current.as_ref());
        tracing::info!(
            kind = %self.kind(),
            target = %plan.target_version_id,
            current = ?plan.current_version_id,
            create_count = plan.summary.create_count,
            delete_count = plan.summary.delete_count,
            "Created rollback plan"
        );

        // Rollback snapshots record the source state the target was synced
        // from, keeping the next run's baseline.
        let current_teama = current.map(|version| version.teama.resources).unwrap_or_default();
        let live_teamb = self.service.fetch_teamb()?;
        let pre_rollback_version = self.versions.create_version_snapshot(
            &current_teama,
            &live_teamb,
            VersionType::PRE_ROLLBACK,
        )?;

        let mut applied = Applied::default();
        self.delete_all(plan.resources_to_delete.clone(), &mut applied);
        self.create_all(plan.resources_to_create.clone(), &mut applied);

        let post_rollback_version = match self.service.fetch_teamb() {
            Ok(final_teamb) => match self.versions.create_version_snapshot(
                &target.teama.resources,
                &final_teamb,
                VersionType::POST_ROLLBACK,
            ) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(kind = %self.kind(), "Failed to create post-rollback snapshot: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!(kind = %self.kind(), "Failed to fetch TeamB after rollback: {}", e);
                None
            }
        };

        let report = RollbackReport {
            kind: self.kind().to_string(),
            target_version_id: plan.target_version_id,
            summary: plan.summary,
            pre_rollback_version,
            post_rollback_version,
            deleted: applied.deleted,
            created: applied.created,
            skipped: applied.skipped,
            failed: applied.failed,
        };

        tracing::info!(
            kind = %self.kind(),
            target = %report.target_version_id,
            success = report.is_clean(),
            failed = report.failed,
            "Rollback completed"
        );
        Ok(report)
    }

    /// Roll back to the version before the current one
    ///
    /// # Errors
    /// `MigrationError::NoRollbackTarget` if there is no previous version,
    /// otherwise as [`rollback_to_version`](Self::rollback_to_version).
    pub fn quick_rollback(&self) -> MigrationResult<RollbackReport> {
        let previous = self.versions.get_previous_version().ok_or_else(|| {
            MigrationError::NoRollbackTarget("no previous version available".to_string())
        })?;
        self.rollback_to_version(&previous.version_id)
    }

    fn delete_all(&self, mut resources: Vec<Resource>, applied: &mut Applied) {
        self.service.order_for_deletion(&mut resources);
        for resource in &resources {
            let id = resource_identifier(resource);
            match self.service.delete_from_teamb(resource) {
                Ok(()) => {
                    tracing::debug!(kind = %self.kind(), resource = %id, "Deleted");
                    applied.deleted += 1;
                }
                Err(e) => {
                    tracing::error!(kind = %self.kind(), resource = %id, "Failed to delete: {}", e);
                    applied.failed += 1;
                }
            }
        }
    }

    fn create_all(&self, mut resources: Vec<Resource>, applied: &mut Applied) {
        self.service.order_for_creation(&mut resources);
        for resource in &resources {
            let id = resource_identifier(resource);
            match self.service.create_in_teamb(resource) {
                Ok(CreateOutcome::Created) => {
                    tracing::debug!(kind = %self.kind(), resource = %id, "Created");
                    applied.created += 1;
                }
                Ok(CreateOutcome::Skipped { reason }) => {
                    tracing::info!(kind = %self.kind(), resource = %id, "Skipped: {}", reason);
                    applied.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(kind = %self.kind(), resource = %id, "Failed to create: {}", e);
                    applied.failed += 1;
                }
            }
        }
    }
}
