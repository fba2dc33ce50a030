// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `finalizers.rs`

#[cfg(test)]
mod tests {
    use crate::constants::IDLING_RESOURCE_FINALIZER;
    use crate::crd::{CrossVersionObjectReference, IdlingResource, IdlingResourceSpec};
    use crate::reconcilers::finalizers::has_finalizer;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    const TEST_NAMESPACE: &str = "test-namespace";
    const TEST_NAME: &str = "test-resource";

    fn test_instance(finalizers: Option<Vec<String>>) -> IdlingResource {
        IdlingResource {
            metadata: ObjectMeta {
                name: Some(TEST_NAME.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                finalizers,
                ..ObjectMeta::default()
            },
            spec: IdlingResourceSpec {
                idling_resource_ref: CrossVersionObjectReference {
                    kind: "Deployment".to_string(),
                    name: "nginx".to_string(),
                    api_version: Some("apps/v1".to_string()),
                },
                idle: false,
                idling_strategy: None,
                wakeup_strategy: None,
            },
            status: None,
        }
    }

    #[test]
    fn test_has_finalizer_without_any() {
        let instance = test_instance(None);
        assert!(!has_finalizer(&instance, IDLING_RESOURCE_FINALIZER));
    }

    #[test]
    fn test_has_finalizer_with_other_finalizers() {
        let instance = test_instance(Some(vec!["other.example.com/finalizer".to_string()]));
        assert!(!has_finalizer(&instance, IDLING_RESOURCE_FINALIZER));
    }

    #[test]
    fn test_has_finalizer_when_present() {
        let instance = test_instance(Some(vec![
            "other.example.com/finalizer".to_string(),
            IDLING_RESOURCE_FINALIZER.to_string(),
        ]));
        assert!(has_finalizer(&instance, IDLING_RESOURCE_FINALIZER));
    }

    #[test]
    fn test_finalizer_string_is_stable() {
        // The wire token is versioned; it must never change across releases.
        assert_eq!(
            IDLING_RESOURCE_FINALIZER,
            "idlingresource.finalizers.kidle.kidle.dev"
        );
    }
}
