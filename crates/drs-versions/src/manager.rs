//! Version Manager - per-kind snapshot history with current/previous pointers
//!
//! Layout under `<versions_storage_path>/<kind>/`:
//! - `v_<YYYYMMDD_HHMMSS>.json` - immutable snapshots
//! - `current.json` - pointer to the newest snapshot
//! - `previous.json` - the pointer `current.json` held before that
//!
//! A snapshot file is always fully written before the pointers move, so a
//! crash leaves at worst an unreferenced snapshot behind.

use crate::config::VersionConfig;
use crate::error::{VersionError, VersionResult};
use crate::rollback::RollbackPlan;
use crate::snapshot::{
    id_sequence, is_valid_version_id, version_id_at, SnapshotHeader, TenantState, VersionPointer,
    VersionSnapshot, VersionSummary, VersionType, VERSION_PREFIX,
};
use drs_store::{
    format_iso, json_file, kind_dir, parse_iso, Resource, SharedClock, StoreResult, SystemClock,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const CURRENT_POINTER: &str = "current.json";
const PREVIOUS_POINTER: &str = "previous.json";
const SNAPSHOT_EXTENSION: &str = "json";

/// Per-resource-kind snapshot store
#[derive(Debug, Clone)]
pub struct VersionManager {
    kind: String,
    dir: PathBuf,
    max_versions: usize,
    clock: SharedClock,
}

impl VersionManager {
    /// Create manager for `kind`, preparing `<versions_storage_path>/<kind>/`
    ///
    /// # Errors
    /// - `VersionError::InvalidConfig` if retention is zero
    /// - `VersionError::Storage` if `kind` is not a plain directory name or
    ///   the directory cannot be created
    pub fn new(config: &VersionConfig, kind: impl Into<String>) -> VersionResult<Self> {
        Self::with_clock(config, kind, SystemClock::shared())
    }

    /// Create manager reading time from `clock`
    ///
    /// # Errors
    /// Same as [`VersionManager::new`].
    pub fn with_clock(
        config: &VersionConfig,
        kind: impl Into<String>,
        clock: SharedClock,
    ) -> VersionResult<Self> {
        config.validate()?;

        let kind = kind.into();
        let dir = kind_dir(&config.versions_storage_path, &kind)?;

        Ok(Self {
            kind,
            dir,
            max_versions: config.max_versions_to_keep,
            clock,
        })
    }

    /// Resource-kind this manager versions
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Per-kind version directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshots retained
    #[inline]
    #[must_use]
    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    /// Record both tenants and make the result the current version
    ///
    /// # Errors
    /// - `VersionError::SnapshotWrite` if the snapshot file cannot be written
    /// - `VersionError::PointerUpdate` if the snapshot was stored but the
    ///   pointers still reference the older version
    pub fn create_version_snapshot(
        &self,
        teama_resources: &[Resource],
        teamb_resources: &[Resource],
        version_type: impl Into<VersionType>,
    ) -> VersionResult<String> {
        self.create_version_snapshot_with(teama_resources, teamb_resources, version_type, Map::new())
    }

    /// [`create_version_snapshot`](Self::create_version_snapshot) with extra metadata
    ///
    /// `extra` entries are merged over the default `created_by` / `purpose`
    /// fields.
    ///
    /// # Errors
    /// Same as [`VersionManager::create_version_snapshot`].
    pub fn create_version_snapshot_with(
        &self,
        teama_resources: &[Resource],
        teamb_resources: &[Resource],
        version_type: impl Into<VersionType>,
        extra: Map<String, Value>,
    ) -> VersionResult<String> {
        let version_type = version_type.into();
        let now = self.clock.now();
        let version_id = self.unused_version_id(&version_id_at(now));
        let timestamp = format_iso(now);

        let mut metadata = Map::new();
        metadata.insert("created_by".to_string(), Value::from("version_manager"));
        metadata.insert(
            "purpose".to_string(),
            Value::from(format!("{version_type}_snapshot")),
        );
        metadata.extend(extra);

        let snapshot = VersionSnapshot {
            version_id: version_id.clone(),
            timestamp: timestamp.clone(),
            service: self.kind.clone(),
            version_type,
            teama: TenantState::capture(teama_resources),
            teamb: TenantState::capture(teamb_resources),
            metadata,
        };

        let path = self.snapshot_path(&version_id);
        if let Err(source) = json_file::write_pretty(&path, &snapshot) {
            tracing::error!(kind = %self.kind, %version_id, "Failed to write version snapshot: {}", source);
            return Err(VersionError::SnapshotWrite { version_id, source });
        }

        if let Err(source) = self.advance_pointers(&version_id, &timestamp) {
            tracing::error!(kind = %self.kind, %version_id, "Failed to update version pointers: {}", source);
            return Err(VersionError::PointerUpdate { version_id, source });
        }

        self.cleanup_old_versions();

        tracing::info!(
            kind = %self.kind,
            %version_id,
            version_type = %snapshot.version_type,
            teama_count = snapshot.teama.count,
            teamb_count = snapshot.teamb.count,
            "Created version snapshot"
        );
        Ok(version_id)
    }

    /// Same-second snapshots get `_2`, `_3`, ... appended
    fn unused_version_id(&self, base: &str) -> String {
        if !self.snapshot_path(base).exists() {
            return base.to_string();
        }
        (2u32..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !self.snapshot_path(candidate).exists())
            .unwrap_or_else(|| base.to_string())
    }

    fn advance_pointers(&self, version_id: &str, timestamp: &str) -> StoreResult<()> {
        let current = self.dir.join(CURRENT_POINTER);
        if let Some(bytes) = json_file::read_bytes(&current)? {
            json_file::write_bytes(&self.dir.join(PREVIOUS_POINTER), &bytes)?;
        }
        json_file::write_pretty(
            &current,
            &VersionPointer {
                version_id: version_id.to_string(),
                updated_at: timestamp.to_string(),
            },
        )
    }

    fn cleanup_old_versions(&self) {
        for stale in self.list_versions(None).into_iter().skip(self.max_versions) {
            match json_file::remove(&stale.file_path) {
                Ok(()) => {
                    tracing::debug!(kind = %self.kind, version_id = %stale.version_id, "Removed old version");
                }
                Err(e) => {
                    tracing::warn!(kind = %self.kind, version_id = %stale.version_id, "Failed to remove old version: {}", e);
                }
            }
        }
    }

    /// Load a snapshot by id
    ///
    /// Returns `None` for ids that are not valid snapshot names, for missing
    /// snapshots, and for unreadable ones (logged).
    #[must_use]
    pub fn get_version(&self, version_id: &str) -> Option<VersionSnapshot> {
        if !is_valid_version_id(version_id) {
            tracing::warn!(kind = %self.kind, %version_id, "Rejected malformed version id");
            return None;
        }

        match json_file::read(&self.snapshot_path(version_id)) {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                tracing::warn!(kind = %self.kind, %version_id, "Version not found");
                None
            }
            Err(e) => {
                tracing::error!(kind = %self.kind, %version_id, "Failed to load version: {}", e);
                None
            }
        }
    }

    /// Snapshot referenced by `current.json`
    #[must_use]
    pub fn get_current_version(&self) -> Option<VersionSnapshot> {
        self.follow_pointer(CURRENT_POINTER)
    }

    /// Snapshot referenced by `previous.json`
    #[must_use]
    pub fn get_previous_version(&self) -> Option<VersionSnapshot> {
        self.follow_pointer(PREVIOUS_POINTER)
    }

    fn follow_pointer(&self, file: &str) -> Option<VersionSnapshot> {
        match json_file::read::<VersionPointer>(&self.dir.join(file)) {
            Ok(Some(pointer)) => self.get_version(&pointer.version_id),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(kind = %self.kind, pointer = file, "Failed to read version pointer: {}", e);
                None
            }
        }
    }

    /// Stored snapshots, newest first
    ///
    /// Files that do not decode as snapshots are skipped with a warning.
    #[must_use]
    pub fn list_versions(&self, limit: Option<usize>) -> Vec<VersionSummary> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(kind = %self.kind, "Failed to list versions: {}", e);
                return Vec::new();
            }
        };

        let mut versions: Vec<VersionSummary> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_snapshot_file(path))
            .filter_map(|path| self.summarize(path))
            .collect();

        versions.sort_by(|a, b| {
            let key_a = (parse_iso(&a.timestamp), &a.timestamp, id_sequence(&a.version_id));
            let key_b = (parse_iso(&b.timestamp), &b.timestamp, id_sequence(&b.version_id));
            key_b.cmp(&key_a)
        });

        if let Some(limit) = limit {
            versions.truncate(limit);
        }
        versions
    }

    fn summarize(&self, path: PathBuf) -> Option<VersionSummary> {
        match json_file::read::<SnapshotHeader>(&path) {
            Ok(Some(header)) => Some(VersionSummary {
                version_id: header.version_id,
                timestamp: header.timestamp,
                version_type: header.version_type,
                teama_count: header.teama.count,
                teamb_count: header.teamb.count,
                file_path: path,
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(kind = %self.kind, "Skipping unreadable version file: {}", e);
                None
            }
        }
    }

    /// Plan restoring the target tenant to `target_version_id`
    ///
    /// The plan deletes what the current version recorded for the target and
    /// recreates what the requested version recorded. `None` if the requested
    /// version cannot be loaded.
    #[must_use]
    pub fn create_rollback_plan(&self, target_version_id: &str) -> Option<RollbackPlan> {
        let target = self.get_version(target_version_id)?;
        let current = self.get_current_version();
        let plan = RollbackPlan::between(&target, current.as_ref());

        tracing::info!(
            kind = %self.kind,
            target = %plan.target_version_id,
            current = ?plan.current_version_id,
            create_count = plan.summary.create_count,
            delete_count = plan.summary.delete_count,
            "Created rollback plan"
        );
        Some(plan)
    }

    /// Newest snapshot that saw a non-empty source
    #[must_use]
    pub fn last_known_good_version(&self) -> Option<VersionSummary> {
        self.list_versions(None)
            .into_iter()
            .find(|summary| summary.teama_count > 0)
    }

    fn snapshot_path(&self, version_id: &str) -> PathBuf {
        self.dir.join(format!("{version_id}.{SNAPSHOT_EXTENSION}"))
    }
}

fn is_snapshot_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SNAPSHOT_EXTENSION)
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.starts_with(VERSION_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use drs_store::{ManualClock, StoreError};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn resource(name: &str) -> Resource {
        json!({ "name": name }).as_object().cloned().unwrap()
    }

    fn setup(max: usize) -> (TempDir, Arc<ManualClock>, VersionManager) {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::shared(
            NaiveDate::from_ymd_opt(2026, 10, 17)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        );
        let config = VersionConfig::new()
            .with_storage_path(dir.path())
            .with_max_versions(max);
        let manager = VersionManager::with_clock(&config, "parsing-rules", clock.clone()).unwrap();
        (dir, clock, manager)
    }

    #[test]
    fn creates_kind_directory() {
        let (dir, _clock, manager) = setup(10);
        assert_eq!(manager.dir(), dir.path().join("parsing-rules"));
        assert!(manager.dir().is_dir());
    }

    #[test]
    fn rejects_kind_outside_storage_root() {
        let dir = TempDir::new().unwrap();
        let config = VersionConfig::new().with_storage_path(dir.path().join("versions"));

        for kind in ["../escape", "a/b", ".."] {
            let err = VersionManager::new(&config, kind).unwrap_err();
            assert!(matches!(err, VersionError::Storage(StoreError::InvalidKind { .. })));
        }
        assert!(!dir.path().join("escape").exists());
    }

    #[test]
    fn snapshot_is_written_with_metadata() {
        let (_dir, _clock, manager) = setup(10);
        let id = manager
            .create_version_snapshot(&[resource("a")], &[], VersionType::MANUAL)
            .unwrap();

        assert_eq!(id, "v_20261017_093000");
        let snapshot = manager.get_version(&id).unwrap();
        assert_eq!(snapshot.service, "parsing-rules");
        assert_eq!(snapshot.timestamp, "2026-10-17T09:30:00.000000");
        assert_eq!(snapshot.metadata["created_by"], json!("version_manager"));
        assert_eq!(snapshot.metadata["purpose"], json!("manual_snapshot"));
        assert_eq!(snapshot.teama.resource_identifiers, vec!["a"]);
        assert_eq!(snapshot.teamb_count(), 0);
    }

    #[test]
    fn extra_metadata_is_merged() {
        let (_dir, _clock, manager) = setup(10);
        let mut extra = Map::new();
        extra.insert("operator".to_string(), json!("oncall"));
        let id = manager
            .create_version_snapshot_with(&[], &[], "audit", extra)
            .unwrap();

        let snapshot = manager.get_version(&id).unwrap();
        assert_eq!(snapshot.metadata["operator"], json!("oncall"));
        assert_eq!(snapshot.metadata["purpose"], json!("audit_snapshot"));
    }

    #[test]
    fn same_second_snapshots_do_not_overwrite() {
        let (_dir, _clock, manager) = setup(10);
        let first = manager.create_version_snapshot(&[resource("a")], &[], "auto").unwrap();
        let second = manager.create_version_snapshot(&[resource("b")], &[], "auto").unwrap();

        assert_eq!(first, "v_20261017_093000");
        assert_eq!(second, "v_20261017_093000_2");
        assert_eq!(manager.get_version(&first).unwrap().teama.resource_identifiers, vec!["a"]);
        assert_eq!(manager.get_current_version().unwrap().version_id, second);
        assert_eq!(manager.get_previous_version().unwrap().version_id, first);
    }

    #[test]
    fn same_second_snapshots_list_by_numeric_suffix() {
        let (_dir, _clock, manager) = setup(20);
        for i in 0..11 {
            manager
                .create_version_snapshot(&[resource(&format!("r{i}"))], &[], "auto")
                .unwrap();
        }

        let ids: Vec<String> = manager
            .list_versions(Some(3))
            .into_iter()
            .map(|summary| summary.version_id)
            .collect();

        assert_eq!(
            ids,
            vec![
                "v_20261017_093000_11",
                "v_20261017_093000_10",
                "v_20261017_093000_9"
            ]
        );
        assert_eq!(
            manager.list_versions(None).last().unwrap().version_id,
            "v_20261017_093000"
        );
    }

    #[test]
    fn pointers_absent_before_first_snapshot() {
        let (_dir, _clock, manager) = setup(10);
        assert!(manager.get_current_version().is_none());
        assert!(manager.get_previous_version().is_none());
        assert!(manager.list_versions(None).is_empty());
        assert!(manager.last_known_good_version().is_none());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let (_dir, _clock, manager) = setup(10);
        assert!(manager.get_version("../current").is_none());
        assert!(manager.get_version("v_missing").is_none());
        assert!(manager.create_rollback_plan("nope").is_none());
    }

    #[test]
    fn corrupt_snapshot_is_skipped_in_listing() {
        let (_dir, clock, manager) = setup(10);
        manager.create_version_snapshot(&[], &[], "auto").unwrap();
        clock.advance(Duration::seconds(1));
        std::fs::write(manager.dir().join("v_broken.json"), b"{ not json").unwrap();

        let versions = manager.list_versions(None);
        assert_eq!(versions.len(), 1);
        assert!(manager.get_version("v_broken").is_none());
    }

    #[test]
    fn listing_respects_limit_and_order() {
        let (_dir, clock, manager) = setup(10);
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(manager.create_version_snapshot(&[], &[], "auto").unwrap());
            clock.advance(Duration::minutes(1));
        }

        let listed: Vec<String> = manager
            .list_versions(Some(2))
            .into_iter()
            .map(|v| v.version_id)
            .collect();
        assert_eq!(listed, vec![ids[3].clone(), ids[2].clone()]);
    }

    #[test]
    fn last_known_good_skips_empty_source() {
        let (_dir, clock, manager) = setup(10);
        let good = manager
            .create_version_snapshot(&[resource("a")], &[resource("a")], "auto")
            .unwrap();
        clock.advance(Duration::seconds(5));
        manager.create_version_snapshot(&[], &[], "auto").unwrap();

        assert_eq!(manager.last_known_good_version().unwrap().version_id, good);
    }
}
