// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the deployment idler decision logic

#[cfg(test)]
mod tests {
    use crate::crd::{CrossVersionObjectReference, IdlingResource, IdlingResourceSpec};
    use crate::idlers::deployment::{needs_idle, needs_wakeup};
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};

    fn instance(idle: bool) -> IdlingResource {
        IdlingResource::new(
            "nginx-idler",
            IdlingResourceSpec {
                idling_resource_ref: CrossVersionObjectReference {
                    kind: "Deployment".to_string(),
                    name: "nginx".to_string(),
                    api_version: Some("apps/v1".to_string()),
                },
                idle,
                idling_strategy: None,
                wakeup_strategy: None,
            },
        )
    }

    fn deployment(replicas: Option<i32>) -> Deployment {
        Deployment {
            spec: Some(DeploymentSpec {
                replicas,
                ..DeploymentSpec::default()
            }),
            ..Deployment::default()
        }
    }

    #[test]
    fn test_needs_idle_only_when_running() {
        assert!(needs_idle(&instance(true), &deployment(Some(2))));
        assert!(!needs_idle(&instance(true), &deployment(Some(0))));
        assert!(!needs_idle(&instance(false), &deployment(Some(2))));
    }

    #[test]
    fn test_needs_wakeup_only_when_idled() {
        assert!(needs_wakeup(&instance(false), &deployment(Some(0))));
        assert!(!needs_wakeup(&instance(false), &deployment(Some(2))));
        assert!(!needs_wakeup(&instance(true), &deployment(Some(0))));
    }

    #[test]
    fn test_nil_replicas_count_as_one() {
        // A deployment without an explicit replica count runs with 1 replica.
        assert!(needs_idle(&instance(true), &deployment(None)));
        assert!(!needs_wakeup(&instance(false), &deployment(None)));
    }

    #[test]
    fn test_steady_states_require_no_transition() {
        // idle=true with replicas already 0, idle=false with replicas > 0
        assert!(!needs_idle(&instance(true), &deployment(Some(0))));
        assert!(!needs_wakeup(&instance(true), &deployment(Some(0))));
        assert!(!needs_idle(&instance(false), &deployment(Some(3))));
        assert!(!needs_wakeup(&instance(false), &deployment(Some(3))));
    }
}
