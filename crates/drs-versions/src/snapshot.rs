//! Version snapshot documents

use chrono::NaiveDateTime;
use drs_store::{resource_identifiers, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

/// Prefix shared by every version id and snapshot file
pub const VERSION_PREFIX: &str = "v_";

/// Build the version id for a creation time (`v_YYYYMMDD_HHMMSS`)
#[must_use]
pub fn version_id_at(at: NaiveDateTime) -> String {
    format!("{VERSION_PREFIX}{}", at.format("%Y%m%d_%H%M%S"))
}

/// Whether `id` is safe to use as a snapshot file stem
#[must_use]
pub fn is_valid_version_id(id: &str) -> bool {
    id.strip_prefix(VERSION_PREFIX).is_some_and(|rest| {
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Length of a version id without a collision suffix
const BASE_ID_LEN: usize = VERSION_PREFIX.len() + "YYYYMMDD_HHMMSS".len();

/// Split `v_YYYYMMDD_HHMMSS_N` into its base id and `N`
///
/// Ids without a numeric suffix are sequence 1, so `_2`, `_3`, ... follow
/// the plain id numerically rather than lexically.
pub(crate) fn id_sequence(id: &str) -> (&str, u32) {
    let suffix = id
        .get(BASE_ID_LEN..)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|n| n.parse::<u32>().ok());
    match (id.get(..BASE_ID_LEN), suffix) {
        (Some(base), Some(n)) => (base, n),
        _ => (id, 1),
    }
}

/// Why a snapshot was taken
///
/// Deliberately open: the well-known values are associated constants, but
/// any string round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionType(Cow<'static, str>);

impl VersionType {
    /// Routine snapshot
    pub const AUTO: Self = Self(Cow::Borrowed("auto"));
    /// Operator-requested snapshot
    pub const MANUAL: Self = Self(Cow::Borrowed("manual"));
    /// Taken before deleting the target's resources
    pub const PRE_MIGRATION: Self = Self(Cow::Borrowed("pre_migration"));
    /// Taken after recreating the target's resources
    pub const POST_MIGRATION: Self = Self(Cow::Borrowed("post_migration"));
    /// Taken before restoring an earlier target state
    pub const PRE_ROLLBACK: Self = Self(Cow::Borrowed("pre_rollback"));
    /// Taken after restoring an earlier target state
    pub const POST_ROLLBACK: Self = Self(Cow::Borrowed("post_rollback"));

    /// Arbitrary version type
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        Self(Cow::Owned(value.into()))
    }

    /// String form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VersionType {
    fn default() -> Self {
        Self::AUTO
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VersionType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One tenant's state inside a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantState {
    /// Number of resources
    pub count: usize,
    /// Full resource payloads
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Identifier of each resource, same order
    #[serde(default)]
    pub resource_identifiers: Vec<String>,
}

impl TenantState {
    /// Capture a resource list
    #[must_use]
    pub fn capture(resources: &[Resource]) -> Self {
        Self {
            count: resources.len(),
            resources: resources.to_vec(),
            resource_identifiers: resource_identifiers(resources),
        }
    }
}

/// Point-in-time record of both tenants for one resource-kind
///
/// Never rewritten once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    /// `v_YYYYMMDD_HHMMSS`
    pub version_id: String,
    /// ISO-8601 creation time
    pub timestamp: String,
    /// Resource-kind
    pub service: String,
    /// Why it was taken
    pub version_type: VersionType,
    /// Source tenant
    pub teama: TenantState,
    /// Target tenant
    pub teamb: TenantState,
    /// Free-form metadata (`created_by`, `purpose`, caller extras)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl VersionSnapshot {
    /// Source count recorded in this snapshot
    #[inline]
    #[must_use]
    pub fn teama_count(&self) -> usize {
        self.teama.count
    }

    /// Target count recorded in this snapshot
    #[inline]
    #[must_use]
    pub fn teamb_count(&self) -> usize {
        self.teamb.count
    }
}

/// Contents of `current.json` / `previous.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPointer {
    /// Snapshot the pointer refers to
    pub version_id: String,
    /// When the pointer was written
    pub updated_at: String,
}

/// Listing entry for a stored snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    /// Snapshot id
    pub version_id: String,
    /// ISO-8601 creation time (sort key)
    pub timestamp: String,
    /// Why it was taken
    pub version_type: VersionType,
    /// Source count
    pub teama_count: usize,
    /// Target count
    pub teamb_count: usize,
    /// Snapshot file
    pub file_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountOnly {
    #[serde(default)]
    pub(crate) count: usize,
}

/// Snapshot header read while listing (resource bodies are skipped)
#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotHeader {
    pub(crate) version_id: String,
    pub(crate) timestamp: String,
    #[serde(default)]
    pub(crate) version_type: VersionType,
    pub(crate) teama: CountOnly,
    pub(crate) teamb: CountOnly,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn collision_suffix_is_numeric() {
        assert_eq!(id_sequence("v_20261017_093000"), ("v_20261017_093000", 1));
        assert_eq!(id_sequence("v_20261017_093000_2"), ("v_20261017_093000", 2));
        assert_eq!(id_sequence("v_20261017_093000_10"), ("v_20261017_093000", 10));
        assert_eq!(id_sequence("v_manual"), ("v_manual", 1));
        assert!(id_sequence("v_20261017_093000_9") < id_sequence("v_20261017_093000_10"));
    }

    #[test]
    fn version_id_format() {
        let at = NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(version_id_at(at), "v_20260102_030405");
    }

    #[test]
    fn version_id_validation() {
        assert!(is_valid_version_id("v_20260102_030405"));
        assert!(is_valid_version_id("v_20260102_030405_2"));
        assert!(!is_valid_version_id("v_"));
        assert!(!is_valid_version_id("20260102_030405"));
        assert!(!is_valid_version_id("v_../../etc/passwd"));
        assert!(!is_valid_version_id("current"));
    }

    #[test]
    fn version_type_is_open() {
        assert_eq!(VersionType::PRE_MIGRATION.as_str(), "pre_migration");
        assert_eq!(VersionType::from("nightly_audit").as_str(), "nightly_audit");

        let value = serde_json::to_value(VersionType::POST_ROLLBACK).unwrap();
        assert_eq!(value, json!("post_rollback"));
        let parsed: VersionType = serde_json::from_value(json!("custom")).unwrap();
        assert_eq!(parsed, VersionType::new("custom"));
        assert_eq!(
            serde_json::from_value::<VersionType>(json!("manual")).unwrap(),
            VersionType::MANUAL
        );
    }

    #[test]
    fn tenant_state_capture() {
        let resources: Vec<Resource> = vec![
            json!({"name": "a"}).as_object().unwrap().clone(),
            json!({"id": 7}).as_object().unwrap().clone(),
        ];
        let state = TenantState::capture(&resources);
        assert_eq!(state.count, 2);
        assert_eq!(state.resource_identifiers, vec!["a", "7"]);
        assert_eq!(state.resources, resources);
    }
}
