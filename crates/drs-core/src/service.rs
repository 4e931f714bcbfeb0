//! Tenant access contract implemented by each resource-kind adapter

use drs_safety::ApiError;
use drs_store::Resource;
use serde_json::Value;
use std::cmp::Ordering;

/// Result of asking the target tenant to create a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The resource now exists in the target
    Created,
    /// The adapter chose not to create it (e.g. a group with no rules)
    Skipped {
        /// Why it was skipped
        reason: String,
    },
}

impl CreateOutcome {
    /// Skipped outcome
    #[inline]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Whether the resource was skipped
    #[inline]
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Access to one resource-kind in both tenants
///
/// Fetches return the complete list of the kind. Adapters surface transport
/// failures as [`ApiError`] and never retry on the caller's behalf.
pub trait ResourceService {
    /// Resource-kind name, used for storage directories and log fields
    fn kind(&self) -> &str;

    /// Every resource of this kind in the source tenant
    ///
    /// # Errors
    /// Transport or API failure.
    fn fetch_teama(&self) -> Result<Vec<Resource>, ApiError>;

    /// Every resource of this kind in the target tenant
    ///
    /// # Errors
    /// Transport or API failure.
    fn fetch_teamb(&self) -> Result<Vec<Resource>, ApiError>;

    /// Delete one resource from the target tenant
    ///
    /// # Errors
    /// Transport or API failure.
    fn delete_from_teamb(&self, resource: &Resource) -> Result<(), ApiError>;

    /// Create one source resource in the target tenant
    ///
    /// # Errors
    /// Transport or API failure.
    fn create_in_teamb(&self, resource: &Resource) -> Result<CreateOutcome, ApiError>;

    /// Reorder target resources before deletion (default: unchanged)
    fn order_for_deletion(&self, _resources: &mut [Resource]) {}

    /// Reorder source resources before creation (default: unchanged)
    fn order_for_creation(&self, _resources: &mut [Resource]) {}
}

/// Field holding a resource's position among its siblings
pub const ORDER_FIELD: &str = "order";

/// Sort by `order` ascending, unordered resources last, ties by `name`
///
/// Suits kinds whose evaluation order matters (rule groups, custom actions).
pub fn sort_for_creation(resources: &mut [Resource]) {
    resources.sort_by(|a, b| {
        compare_order(order_of(a), order_of(b)).then_with(|| name_of(a).cmp(name_of(b)))
    });
}

/// Sort by `order` descending, unordered resources last
///
/// Removes the highest positions first so the remaining ones never need to
/// be renumbered by the tenant.
pub fn sort_for_deletion(resources: &mut [Resource]) {
    resources.sort_by(|a, b| match (order_of(a), order_of(b)) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (a, b) => compare_order(a, b),
    });
}

fn order_of(resource: &Resource) -> Option<f64> {
    resource.get(ORDER_FIELD).and_then(Value::as_f64)
}

fn name_of(resource: &Resource) -> &str {
    resource.get("name").and_then(Value::as_str).unwrap_or_default()
}

/// Ordered before unordered, then numerically
fn compare_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
