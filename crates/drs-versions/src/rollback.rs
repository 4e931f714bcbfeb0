//! Rollback plans
//!
//! A rollback restores the target tenant to a state it was observed in
//! earlier. The source tenant is never part of it.

use crate::snapshot::VersionSnapshot;
use drs_store::Resource;
use serde::{Deserialize, Serialize};

/// Counts summarizing a rollback plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackSummary {
    /// Target resources in the version being restored
    pub target_count: usize,
    /// Target resources tracked by the current version
    pub current_count: usize,
    /// Resources to create
    pub create_count: usize,
    /// Resources to delete
    pub delete_count: usize,
}

/// Delete/create sets restoring the target to an earlier version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackPlan {
    /// Version being restored
    pub target_version_id: String,
    /// Its creation time
    pub target_timestamp: String,
    /// Version the plan diffs against, if one exists
    pub current_version_id: Option<String>,
    /// Target resources recorded in the restored version
    pub resources_to_create: Vec<Resource>,
    /// Target resources recorded in the current version
    pub resources_to_delete: Vec<Resource>,
    /// Counts
    pub summary: RollbackSummary,
}

impl RollbackPlan {
    /// Plan restoring `target`, deleting what `current` tracks
    #[must_use]
    pub fn between(target: &VersionSnapshot, current: Option<&VersionSnapshot>) -> Self {
        let resources_to_create = target.teamb.resources.clone();
        let resources_to_delete = current
            .map(|c| c.teamb.resources.clone())
            .unwrap_or_default();

        let summary = RollbackSummary {
            target_count: resources_to_create.len(),
            current_count: resources_to_delete.len(),
            create_count: resources_to_create.len(),
            delete_count: resources_to_delete.len(),
        };

        Self {
            target_version_id: target.version_id.clone(),
            target_timestamp: target.timestamp.clone(),
            current_version_id: current.map(|c| c.version_id.clone()),
            resources_to_create,
            resources_to_delete,
            summary,
        }
    }

    /// Whether executing the plan would change nothing
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.resources_to_create.is_empty() && self.resources_to_delete.is_empty()
    }
}
