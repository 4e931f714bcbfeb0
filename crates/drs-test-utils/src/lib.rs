//! Testing utilities for DRS workspace
//!
//! Shared fixtures and an in-memory pair of tenants with fault injection.

#![allow(missing_docs)]

use chrono::{NaiveDate, NaiveDateTime};
use drs_core::{CreateOutcome, DrConfig, ResourceService};
use drs_safety::ApiError;
use drs_store::{resource_identifier, ManualClock, Resource};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tempfile::TempDir;

/// Fixed start time for manual clocks: 2026-01-15T08:00:00
pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 15)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    ManualClock::shared(epoch())
}

/// Build a resource from a JSON object literal
pub fn resource(value: Value) -> Resource {
    value.as_object().cloned().expect("fixture must be a JSON object")
}

/// `n` resources named `<prefix>-<i>` with `order = i`
pub fn named_resources(prefix: &str, n: usize) -> Vec<Resource> {
    (0..n)
        .map(|i| resource(json!({ "name": format!("{prefix}-{i}"), "order": i, "enabled": true })))
        .collect()
}

/// Config with both storage roots inside a fresh temp directory
pub fn temp_config() -> (TempDir, DrConfig) {
    let dir = TempDir::new().unwrap();
    let config = DrConfig::new().with_storage_root(dir.path());
    (dir, config)
}

#[derive(Debug, Default)]
struct Faults {
    teama_error: Option<ApiError>,
    teamb_error: Option<ApiError>,
    failing_deletes: BTreeSet<String>,
    stuck_deletes: BTreeSet<String>,
    failing_creates: BTreeSet<String>,
    dropped_creates: BTreeSet<String>,
    skipped_creates: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Tenants {
    teama: Vec<Resource>,
    teamb: Vec<Resource>,
    faults: Faults,
    next_id: u64,
    delete_calls: Vec<String>,
    create_calls: Vec<String>,
}

/// Two tenants held in memory
///
/// Clones share state, so a test can keep a handle while the migrator owns
/// another. Faults are keyed by resource identifier.
#[derive(Debug, Clone)]
pub struct InMemoryTenantService {
    kind: String,
    tenants: Arc<Mutex<Tenants>>,
}

impl InMemoryTenantService {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            tenants: Arc::new(Mutex::new(Tenants::default())),
        }
    }

    #[must_use]
    pub fn with_teama(self, resources: Vec<Resource>) -> Self {
        self.set_teama(resources);
        self
    }

    #[must_use]
    pub fn with_teamb(self, resources: Vec<Resource>) -> Self {
        self.set_teamb(resources);
        self
    }

    pub fn set_teama(&self, resources: Vec<Resource>) {
        self.tenants.lock().teama = resources;
    }

    pub fn set_teamb(&self, resources: Vec<Resource>) {
        self.tenants.lock().teamb = resources;
    }

    pub fn teama(&self) -> Vec<Resource> {
        self.tenants.lock().teama.clone()
    }

    pub fn teamb(&self) -> Vec<Resource> {
        self.tenants.lock().teamb.clone()
    }

    /// Identifiers currently in the target, in storage order
    pub fn teamb_identifiers(&self) -> Vec<String> {
        self.tenants.lock().teamb.iter().map(resource_identifier).collect()
    }

    pub fn fail_teama_fetch(&self, error: ApiError) {
        self.tenants.lock().faults.teama_error = Some(error);
    }

    pub fn fail_teamb_fetch(&self, error: ApiError) {
        self.tenants.lock().faults.teamb_error = Some(error);
    }

    pub fn clear_faults(&self) {
        self.tenants.lock().faults = Faults::default();
    }

    /// Deleting `id` returns an error
    pub fn fail_delete(&self, id: impl Into<String>) {
        self.tenants.lock().faults.failing_deletes.insert(id.into());
    }

    /// Deleting `id` reports success but the resource stays
    pub fn stick_delete(&self, id: impl Into<String>) {
        self.tenants.lock().faults.stuck_deletes.insert(id.into());
    }

    /// Creating `id` returns an error
    pub fn fail_create(&self, id: impl Into<String>) {
        self.tenants.lock().faults.failing_creates.insert(id.into());
    }

    /// Creating `id` reports success but nothing is stored
    pub fn drop_create(&self, id: impl Into<String>) {
        self.tenants.lock().faults.dropped_creates.insert(id.into());
    }

    /// Creating `id` is declined by the adapter
    pub fn skip_create(&self, id: impl Into<String>, reason: impl Into<String>) {
        self.tenants
            .lock()
            .faults
            .skipped_creates
            .insert(id.into(), reason.into());
    }

    /// Identifiers passed to `delete_from_teamb`, in call order
    pub fn delete_calls(&self) -> Vec<String> {
        self.tenants.lock().delete_calls.clone()
    }

    /// Identifiers passed to `create_in_teamb`, in call order
    pub fn create_calls(&self) -> Vec<String> {
        self.tenants.lock().create_calls.clone()
    }
}

impl ResourceService for InMemoryTenantService {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn fetch_teama(&self) -> Result<Vec<Resource>, ApiError> {
        let tenants = self.tenants.lock();
        match &tenants.faults.teama_error {
            Some(error) => Err(error.clone()),
            None => Ok(tenants.teama.clone()),
        }
    }

    fn fetch_teamb(&self) -> Result<Vec<Resource>, ApiError> {
        let tenants = self.tenants.lock();
        match &tenants.faults.teamb_error {
            Some(error) => Err(error.clone()),
            None => Ok(tenants.teamb.clone()),
        }
    }

    fn delete_from_teamb(&self, resource: &Resource) -> Result<(), ApiError> {
        let id = resource_identifier(resource);
        let mut tenants = self.tenants.lock();
        tenants.delete_calls.push(id.clone());

        if tenants.faults.failing_deletes.contains(&id) {
            return Err(ApiError::http(500, format!("delete of {id} failed")));
        }
        if tenants.faults.stuck_deletes.contains(&id) {
            return Ok(());
        }
        let position = tenants.teamb.iter().position(|r| resource_identifier(r) == id);
        match position {
            Some(index) => {
                tenants.teamb.remove(index);
                Ok(())
            }
            None => Err(ApiError::http(404, format!("{id} not found"))),
        }
    }

    fn create_in_teamb(&self, resource: &Resource) -> Result<CreateOutcome, ApiError> {
        let id = resource_identifier(resource);
        let mut tenants = self.tenants.lock();
        tenants.create_calls.push(id.clone());

        if let Some(reason) = tenants.faults.skipped_creates.get(&id) {
            return Ok(CreateOutcome::skipped(reason.clone()));
        }
        if tenants.faults.failing_creates.contains(&id) {
            return Err(ApiError::http(400, format!("create of {id} rejected")));
        }
        if tenants.faults.dropped_creates.contains(&id) {
            return Ok(CreateOutcome::Created);
        }

        tenants.next_id += 1;
        let mut stored = resource.clone();
        stored.insert("id".to_string(), json!(format!("b-{}", tenants.next_id)));
        tenants.teamb.push(stored);
        Ok(CreateOutcome::Created)
    }

    fn order_for_deletion(&self, resources: &mut [Resource]) {
        drs_core::sort_for_deletion(resources);
    }

    fn order_for_creation(&self, resources: &mut [Resource]) {
        drs_core::sort_for_creation(resources);
    }
}
