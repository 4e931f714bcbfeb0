//! Migration runs against in-memory tenants

use chrono::Duration;
use drs_core::{DrConfig, MigrationError, Migrator};
use drs_safety::ApiError;
use drs_store::ManualClock;
use drs_test_utils::{manual_clock, named_resources, resource, temp_config, InMemoryTenantService};
use drs_versions::VersionType;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    config: DrConfig,
    clock: Arc<ManualClock>,
    service: InMemoryTenantService,
}

impl Harness {
    fn new(kind: &str) -> Self {
        let (dir, config) = temp_config();
        Self {
            _dir: dir,
            config,
            clock: manual_clock(),
            service: InMemoryTenantService::new(kind),
        }
    }

    fn migrator(&self) -> Migrator<InMemoryTenantService> {
        Migrator::with_clock(self.service.clone(), &self.config, self.clock.clone()).unwrap()
    }

    /// Record a version whose source count becomes the next run's baseline
    fn seed_baseline(&self, teama_count: usize) {
        let migrator = self.migrator();
        migrator
            .versions()
            .create_version_snapshot(
                &named_resources("seed", teama_count),
                &named_resources("seed", teama_count),
                VersionType::AUTO,
            )
            .unwrap();
        self.clock.advance(Duration::seconds(1));
    }
}

#[test]
fn ten_to_ten_sync_replaces_target() {
    let h = Harness::new("parsing-rules");
    h.seed_baseline(10);
    h.service.set_teama(named_resources("rule", 10));
    h.service.set_teamb(named_resources("old", 10));

    let migrator = h.migrator();
    let report = migrator.migrate().unwrap();

    assert_eq!(report.teama_count, 10);
    assert_eq!(report.teamb_before, 10);
    assert_eq!(report.teamb_after, 10);
    assert_eq!(report.deleted, 10);
    assert_eq!(report.created, 10);
    assert!(report.is_clean());

    let post_id = report.post_migration_version.clone().unwrap();
    let post = migrator.versions().get_version(&post_id).unwrap();
    assert_eq!(post.version_type, VersionType::POST_MIGRATION);
    assert_eq!(post.teama_count(), 10);
    assert_eq!(post.teamb_count(), 10);

    let pre = migrator.versions().get_previous_version().unwrap();
    assert_eq!(pre.version_id, report.pre_migration_version);
    assert_eq!(pre.teamb.resource_identifiers[0], "old-0");

    let mut expected: Vec<String> = (0..10).map(|i| format!("rule-{i}")).collect();
    let mut actual = h.service.teamb_identifiers();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
}

#[test]
fn first_run_into_empty_target() {
    let h = Harness::new("custom-actions");
    h.service.set_teama(named_resources("action", 5));

    let migrator = h.migrator();
    let report = migrator.migrate().unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.created, 5);
    assert_eq!(migrator.versions().list_versions(None).len(), 2);
    assert_eq!(
        migrator.versions().get_current_version().unwrap().teama_count(),
        5
    );
    assert!(h.service.delete_calls().is_empty());
}

#[test]
fn source_fetch_error_aborts_before_any_write() {
    let h = Harness::new("enrichments");
    h.seed_baseline(4);
    h.service.set_teamb(named_resources("kept", 4));
    h.service.fail_teama_fetch(ApiError::http(503, "Service Unavailable"));

    let migrator = h.migrator();
    let err = migrator.migrate().unwrap_err();

    assert!(matches!(err, MigrationError::Fetch(ref e) if e.status_code == Some(503)));
    assert!(err.is_retryable());
    assert_eq!(h.service.teamb().len(), 4);
    assert_eq!(migrator.versions().list_versions(None).len(), 1);
    assert_eq!(migrator.safety().recent_zero_results(), 0);
}

#[test]
fn empty_source_after_nonzero_history_is_blocked() {
    let h = Harness::new("views");
    h.seed_baseline(8);
    h.service.set_teamb(named_resources("view", 8));

    let migrator = h.migrator();
    let err = migrator.migrate().unwrap_err();

    assert!(err.is_safety_block());
    match &err {
        MigrationError::UnsafeFetch { reason, details } => {
            assert!(reason.contains("previously had 8"));
            assert_eq!(details["recommendation"], json!("verify_teama_manually"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(migrator.safety().recent_zero_results(), 1);
    assert!(h.service.delete_calls().is_empty());
    assert_eq!(h.service.teamb().len(), 8);
}

#[test]
fn empty_source_after_empty_baseline_is_blocked() {
    let h = Harness::new("views");
    h.seed_baseline(0);
    h.service.set_teamb(named_resources("view", 3));

    let migrator = h.migrator();
    let err = migrator.migrate().unwrap_err();

    match &err {
        MigrationError::UnsafeFetch { reason, details } => {
            assert!(reason.contains("previously had 0"));
            assert_eq!(details["previous_count"], json!(0));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(migrator.safety().recent_zero_results(), 1);
    assert!(h.service.delete_calls().is_empty());
    assert_eq!(h.service.teamb().len(), 3);
}

#[test]
fn sharp_source_drop_is_blocked() {
    let h = Harness::new("alerts");
    h.seed_baseline(100);
    h.service.set_teama(named_resources("alert", 40));
    h.service.set_teamb(named_resources("alert", 100));

    let err = h.migrator().migrate().unwrap_err();

    match err {
        MigrationError::UnsafeFetch { details, .. } => {
            assert_eq!(details["previous_count"], json!(100));
            assert_eq!(details["current_count"], json!(40));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.service.teamb().len(), 100);
}

#[test]
fn empty_source_against_large_target_blocks_deletion() {
    let h = Harness::new("tco");
    h.service.set_teamb(named_resources("policy", 20));

    let migrator = h.migrator();
    let err = migrator.migrate().unwrap_err();

    match &err {
        MigrationError::UnsafeDeletion { reason, .. } => assert!(reason.starts_with("Suspicious")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_safety_block());
    assert!(h.service.delete_calls().is_empty());
    assert_eq!(h.service.teamb().len(), 20);

    let versions = migrator.versions().list_versions(None);
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_type, VersionType::PRE_MIGRATION);
}

#[test]
fn stuck_deletion_fails_verification_before_creating() {
    let h = Harness::new("webhooks");
    h.service.set_teama(named_resources("hook", 3));
    h.service.set_teamb(named_resources("hook", 3));
    h.service.stick_delete("hook-1");

    let err = h.migrator().migrate().unwrap_err();

    assert!(matches!(err, MigrationError::DeletionVerification { remaining: 1 }));
    assert!(h.service.create_calls().is_empty());
}

#[test]
fn failed_deletion_fails_verification() {
    let h = Harness::new("webhooks");
    h.service.set_teama(named_resources("hook", 2));
    h.service.set_teamb(named_resources("hook", 2));
    h.service.fail_delete("hook-0");

    let err = h.migrator().migrate().unwrap_err();

    assert!(matches!(err, MigrationError::DeletionVerification { remaining: 1 }));
    assert!(!err.is_retryable());
}

#[test]
fn lost_creation_fails_verification() {
    let h = Harness::new("slo");
    h.service.set_teama(named_resources("slo", 3));
    h.service.drop_create("slo-2");

    let err = h.migrator().migrate().unwrap_err();

    assert!(matches!(
        err,
        MigrationError::CreationVerification {
            expected: 3,
            actual: 2
        }
    ));
}

#[test]
fn skipped_creations_reduce_expected_count() {
    let h = Harness::new("parsing-rules");
    h.service.set_teama(named_resources("group", 3));
    h.service.skip_create("group-1", "rule group has no rules");

    let report = h.migrator().migrate().unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.teamb_after, 2);
    assert_eq!(report.total_operations(), 3);
    assert!(report.is_clean());
}

#[test]
fn ordering_hooks_drive_call_order() {
    let h = Harness::new("parsing-rules");
    let mut teama = named_resources("group", 4);
    teama.reverse();
    h.service.set_teama(teama);
    h.service.set_teamb(named_resources("stale", 3));

    h.migrator().migrate().unwrap();

    assert_eq!(h.service.delete_calls(), vec!["stale-2", "stale-1", "stale-0"]);
    assert_eq!(
        h.service.create_calls(),
        vec!["group-0", "group-1", "group-2", "group-3"]
    );
}

#[test]
fn successful_run_becomes_next_baseline() {
    let h = Harness::new("events2metrics");
    h.service.set_teama(named_resources("e2m", 6));

    h.migrator().migrate().unwrap();
    h.clock.advance(Duration::minutes(10));

    h.service.set_teama(named_resources("e2m", 2));
    let err = h.migrator().migrate().unwrap_err();
    assert!(matches!(err, MigrationError::UnsafeFetch { .. }));
}

#[test]
fn dry_run_reports_without_writing() {
    let h = Harness::new("enrichments");
    h.service.set_teama(vec![
        resource(json!({"name": "same", "field": "ip"})),
        resource(json!({"name": "changed", "field": "new"})),
        resource(json!({"name": "added", "field": "host"})),
    ]);
    h.service.set_teamb(vec![
        resource(json!({"name": "same", "field": "ip", "id": "b-9"})),
        resource(json!({"name": "changed", "field": "old"})),
        resource(json!({"name": "removed", "field": "user"})),
    ]);

    let migrator = h.migrator();
    let report = migrator.dry_run().unwrap();

    assert_eq!(report.would_delete, 3);
    assert_eq!(report.would_create, 3);
    assert_eq!(report.comparison.only_in_teama.len(), 1);
    assert_eq!(report.comparison.only_in_teamb.len(), 1);
    assert_eq!(report.comparison.different_resources[0].resource_id, "changed");
    assert_eq!(report.comparison.unchanged_count, 1);
    assert!(report.would_proceed());

    assert!(h.service.delete_calls().is_empty());
    assert!(h.service.create_calls().is_empty());
    assert!(migrator.versions().list_versions(None).is_empty());
}

#[test]
fn dry_run_treats_unreachable_target_as_empty() {
    let h = Harness::new("views");
    h.service.set_teama(named_resources("view", 2));
    h.service.fail_teamb_fetch(ApiError::new("connection refused"));

    let report = h.migrator().dry_run().unwrap();

    assert_eq!(report.would_delete, 0);
    assert_eq!(report.comparison.only_in_teama.len(), 2);
    assert_eq!(
        report.mass_deletion_check.detail("delete_count"),
        Some(&json!(0))
    );
}
