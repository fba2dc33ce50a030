// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the statefulset idler decision logic

#[cfg(test)]
mod tests {
    use crate::crd::{CrossVersionObjectReference, IdlingResource, IdlingResourceSpec};
    use crate::idlers::statefulset::{needs_idle, needs_wakeup};
    use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};

    fn instance(idle: bool) -> IdlingResource {
        IdlingResource::new(
            "db-idler",
            IdlingResourceSpec {
                idling_resource_ref: CrossVersionObjectReference {
                    kind: "StatefulSet".to_string(),
                    name: "db".to_string(),
                    api_version: Some("apps/v1".to_string()),
                },
                idle,
                idling_strategy: None,
                wakeup_strategy: None,
            },
        )
    }

    fn statefulset(replicas: Option<i32>) -> StatefulSet {
        StatefulSet {
            spec: Some(StatefulSetSpec {
                replicas,
                ..StatefulSetSpec::default()
            }),
            ..StatefulSet::default()
        }
    }

    #[test]
    fn test_needs_idle_only_when_running() {
        assert!(needs_idle(&instance(true), &statefulset(Some(1))));
        assert!(!needs_idle(&instance(true), &statefulset(Some(0))));
        assert!(!needs_idle(&instance(false), &statefulset(Some(1))));
    }

    #[test]
    fn test_needs_wakeup_only_when_idled() {
        assert!(needs_wakeup(&instance(false), &statefulset(Some(0))));
        assert!(!needs_wakeup(&instance(false), &statefulset(Some(1))));
        assert!(!needs_wakeup(&instance(true), &statefulset(Some(0))));
    }

    #[test]
    fn test_nil_replicas_count_as_one() {
        assert!(needs_idle(&instance(true), &statefulset(None)));
        assert!(!needs_wakeup(&instance(false), &statefulset(None)));
    }
}
