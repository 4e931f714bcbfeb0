//! Outcome summaries returned by the migrator

use crate::compare::TenantComparison;
use drs_safety::SafetyCheckResult;
use drs_versions::RollbackSummary;
use serde::Serialize;
use std::fmt;

/// Result of a completed migration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Resource-kind
    pub kind: String,
    /// Source resources fetched
    pub teama_count: usize,
    /// Target resources before deletion
    pub teamb_before: usize,
    /// Target resources after creation
    pub teamb_after: usize,
    /// Successful deletions
    pub deleted: usize,
    /// Successful creations
    pub created: usize,
    /// Creations the adapter skipped
    pub skipped: usize,
    /// Individual delete/create calls that failed
    pub failed: usize,
    /// Snapshot taken before any deletion
    pub pre_migration_version: String,
    /// Snapshot of the final state, absent if it could not be written
    pub post_migration_version: Option<String>,
}

impl MigrationReport {
    /// Whether every individual operation succeeded
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Total operations attempted
    #[inline]
    #[must_use]
    pub fn total_operations(&self) -> usize {
        self.deleted + self.created + self.skipped + self.failed
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MIGRATION RESULTS - {}", self.kind)?;
        writeln!(f, "  TeamA resources:          {}", self.teama_count)?;
        writeln!(f, "  TeamB resources (before): {}", self.teamb_before)?;
        writeln!(f, "  TeamB resources (after):  {}", self.teamb_after)?;
        writeln!(f, "  Deleted from TeamB:       {}", self.deleted)?;
        writeln!(f, "  Created:                  {}", self.created)?;
        if self.skipped > 0 {
            writeln!(f, "  Skipped:                  {}", self.skipped)?;
        }
        if self.failed > 0 {
            writeln!(f, "  Failed:                   {}", self.failed)?;
        }
        write!(f, "  Total operations:         {}", self.total_operations())
    }
}

/// What a migration would do, computed without writing anything
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DryRunReport {
    /// Resource-kind
    pub kind: String,
    /// Identifier-level differences between the tenants
    pub comparison: TenantComparison,
    /// Target resources a migration would delete
    pub would_delete: usize,
    /// Source resources a migration would create
    pub would_create: usize,
    /// Verdict the mass-deletion gate would reach now
    pub mass_deletion_check: SafetyCheckResult,
}

impl DryRunReport {
    /// Whether a real migration would pass the deletion gate
    #[inline]
    #[must_use]
    pub fn would_proceed(&self) -> bool {
        self.mass_deletion_check.is_safe()
    }
}

/// Result of a rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    /// Resource-kind
    pub kind: String,
    /// Version restored
    pub target_version_id: String,
    /// Plan counts
    pub summary: RollbackSummary,
    /// Snapshot of the target before the rollback
    pub pre_rollback_version: String,
    /// Snapshot after the rollback, absent if it could not be written
    pub post_rollback_version: Option<String>,
    /// Successful deletions
    pub deleted: usize,
    /// Successful creations
    pub created: usize,
    /// Creations the adapter skipped
    pub skipped: usize,
    /// Individual delete/create calls that failed
    pub failed: usize,
}

impl RollbackReport {
    /// Whether every individual operation succeeded
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
