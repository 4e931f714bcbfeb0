//! Opaque tenant resources
//!
//! Resource payloads differ per resource-kind and are never interpreted by
//! the safety or version layers beyond counting them and probing a display
//! identifier.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A resource as returned by a tenant API: an arbitrary JSON object
pub type Resource = Map<String, Value>;

/// Fields probed, in order, for a human-meaningful identifier
pub const IDENTIFIER_FIELDS: [&str; 3] = ["name", "id", "title"];

/// Best-effort identifier for a resource
///
/// Returns the first non-empty value of `name`, `id` or `title`. Resources
/// carrying none of them are identified by a content hash of their
/// canonical (key-sorted) JSON encoding.
#[must_use]
pub fn resource_identifier(resource: &Resource) -> String {
    IDENTIFIER_FIELDS
        .iter()
        .filter_map(|field| resource.get(*field))
        .find(|value| is_present(value))
        .map_or_else(|| content_hash(resource), display_value)
}

/// Identifiers for a list of resources, in order
#[must_use]
pub fn resource_identifiers(resources: &[Resource]) -> Vec<String> {
    resources.iter().map(resource_identifier).collect()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// `Map` is key-sorted (no `preserve_order`), so encoding is canonical.
fn content_hash(resource: &Resource) -> String {
    let encoded = serde_json::to_vec(resource).unwrap_or_default();
    let digest = Sha256::digest(&encoded);
    format!("sha256:{}", hex::encode(&digest[..16]))
}
