//! Identifier-keyed comparison of the two tenants

use drs_store::{resource_identifier, Resource};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fields assigned by the tenant itself, ignored when comparing content
pub const VOLATILE_FIELDS: [&str; 5] =
    ["id", "created_at", "updated_at", "created_time", "updated_time"];

/// Whether two resources carry the same content, ignoring volatile fields
#[must_use]
pub fn resources_equal(a: &Resource, b: &Resource) -> bool {
    let stable = |r: &Resource| {
        r.iter()
            .filter(|(key, _)| !VOLATILE_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<BTreeMap<_, _>>()
    };
    stable(a) == stable(b)
}

/// A resource present in both tenants with different content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDifference {
    /// Shared identifier
    pub resource_id: String,
    /// Source version
    pub teama_resource: Resource,
    /// Target version
    pub teamb_resource: Resource,
}

/// Differences between source and target for one resource-kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TenantComparison {
    /// Source count
    pub teama_count: usize,
    /// Target count
    pub teamb_count: usize,
    /// Present only in the source
    pub only_in_teama: Vec<Resource>,
    /// Present only in the target
    pub only_in_teamb: Vec<Resource>,
    /// Present in both, content differs
    pub different_resources: Vec<ResourceDifference>,
    /// Present in both with equal content
    pub unchanged_count: usize,
}

impl TenantComparison {
    /// Compare by [`resource_identifier`]
    ///
    /// When several resources share an identifier the last one wins, as it
    /// would in a keyed lookup.
    #[must_use]
    pub fn between(teama: &[Resource], teamb: &[Resource]) -> Self {
        let a_by_id = keyed(teama);
        let b_by_id = keyed(teamb);

        let mut comparison = Self {
            teama_count: teama.len(),
            teamb_count: teamb.len(),
            ..Self::default()
        };

        for (id, resource) in &a_by_id {
            match b_by_id.get(id) {
                None => comparison.only_in_teama.push((*resource).clone()),
                Some(other) if !resources_equal(resource, other) => {
                    comparison.different_resources.push(ResourceDifference {
                        resource_id: id.clone(),
                        teama_resource: (*resource).clone(),
                        teamb_resource: (*other).clone(),
                    });
                }
                Some(_) => comparison.unchanged_count += 1,
            }
        }
        comparison.only_in_teamb = b_by_id
            .iter()
            .filter(|(id, _)| !a_by_id.contains_key(*id))
            .map(|(_, resource)| (*resource).clone())
            .collect();

        comparison
    }

    /// Whether a migration would change the target's content
    #[must_use]
    pub fn sync_needed(&self) -> bool {
        !self.only_in_teama.is_empty()
            || !self.only_in_teamb.is_empty()
            || !self.different_resources.is_empty()
    }
}

fn keyed(resources: &[Resource]) -> BTreeMap<String, &Resource> {
    resources
        .iter()
        .map(|resource| (resource_identifier(resource), resource))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn r(value: serde_json::Value) -> Resource {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn volatile_fields_are_ignored() {
        let a = r(json!({"name": "x", "id": "1", "updated_at": "yesterday", "query": "q"}));
        let b = r(json!({"name": "x", "id": "2", "created_time": 5, "query": "q"}));
        assert!(resources_equal(&a, &b));

        let c = r(json!({"name": "x", "query": "other"}));
        assert!(!resources_equal(&a, &c));
    }

    #[test]
    fn classifies_each_side() {
        let teama = vec![
            r(json!({"name": "same", "v": 1})),
            r(json!({"name": "changed", "v": 1})),
            r(json!({"name": "new", "v": 1})),
        ];
        let teamb = vec![
            r(json!({"name": "same", "v": 1, "id": "b-1"})),
            r(json!({"name": "changed", "v": 2})),
            r(json!({"name": "stale", "v": 1})),
        ];

        let comparison = TenantComparison::between(&teama, &teamb);

        assert_eq!(comparison.teama_count, 3);
        assert_eq!(comparison.teamb_count, 3);
        assert_eq!(comparison.only_in_teama, vec![teama[2].clone()]);
        assert_eq!(comparison.only_in_teamb, vec![teamb[2].clone()]);
        assert_eq!(comparison.different_resources.len(), 1);
        assert_eq!(comparison.different_resources[0].resource_id, "changed");
        assert_eq!(comparison.unchanged_count, 1);
        assert!(comparison.sync_needed());
    }

    #[test]
    fn identical_tenants_need_no_sync() {
        let teama = vec![r(json!({"name": "a"})), r(json!({"name": "b"}))];
        let comparison = TenantComparison::between(&teama, &teama);
        assert!(!comparison.sync_needed());
        assert_eq!(comparison.unchanged_count, 2);
    }
}
