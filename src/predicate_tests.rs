// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `predicate.rs`

#[cfg(test)]
mod tests {
    use crate::constants::{METADATA_EXPECTED_STATE, METADATA_IDLING_RESOURCE_REFERENCE};
    use crate::predicate::{
        managed_workload_target, replicas_state, should_enqueue, suspend_state,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn meta_with(entries: &[(&str, &str)]) -> ObjectMeta {
        let annotations: BTreeMap<String, String> = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ObjectMeta {
            name: Some("nginx".to_string()),
            namespace: Some("default".to_string()),
            annotations: Some(annotations),
            ..ObjectMeta::default()
        }
    }

    #[test]
    fn test_replicas_state_rendering() {
        assert_eq!(replicas_state(Some(0)), "0");
        assert_eq!(replicas_state(Some(3)), "3");
        // Nil replicas default to 1
        assert_eq!(replicas_state(None), "1");
    }

    #[test]
    fn test_suspend_state_rendering() {
        assert_eq!(suspend_state(Some(true)), "true");
        assert_eq!(suspend_state(Some(false)), "false");
        // Nil suspend defaults to false
        assert_eq!(suspend_state(None), "false");
    }

    #[test]
    fn test_unmanaged_workload_is_dropped() {
        let meta = meta_with(&[(METADATA_EXPECTED_STATE, "0")]);
        assert!(!should_enqueue(&meta, "3"));
    }

    #[test]
    fn test_own_write_is_dropped() {
        // The operator wrote replicas=0 and expected-state=0; the resulting
        // update event observes exactly the expected state.
        let meta = meta_with(&[
            (METADATA_IDLING_RESOURCE_REFERENCE, "nginx-idler"),
            (METADATA_EXPECTED_STATE, "0"),
        ]);
        assert!(!should_enqueue(&meta, "0"));
    }

    #[test]
    fn test_external_write_is_enqueued() {
        // A user scaled the workload away from the expected state.
        let meta = meta_with(&[
            (METADATA_IDLING_RESOURCE_REFERENCE, "nginx-idler"),
            (METADATA_EXPECTED_STATE, "0"),
        ]);
        assert!(should_enqueue(&meta, "3"));
    }

    #[test]
    fn test_missing_expected_state_is_dropped() {
        let meta = meta_with(&[(METADATA_IDLING_RESOURCE_REFERENCE, "nginx-idler")]);
        assert!(!should_enqueue(&meta, "3"));
    }

    #[test]
    fn test_suspend_mismatch_is_enqueued() {
        let meta = meta_with(&[
            (METADATA_IDLING_RESOURCE_REFERENCE, "hello-idler"),
            (METADATA_EXPECTED_STATE, "true"),
        ]);
        assert!(should_enqueue(&meta, "false"));
        assert!(!should_enqueue(&meta, "true"));
    }

    #[test]
    fn test_target_maps_to_the_managing_idlingresource() {
        let meta = meta_with(&[
            (METADATA_IDLING_RESOURCE_REFERENCE, "nginx-idler"),
            (METADATA_EXPECTED_STATE, "0"),
        ]);

        let target = managed_workload_target(&meta, "2").expect("event should enqueue");
        assert_eq!(target.name, "nginx-idler");
        assert_eq!(target.namespace.as_deref(), Some("default"));
    }

    #[test]
    fn test_target_is_none_when_filtered() {
        let meta = meta_with(&[
            (METADATA_IDLING_RESOURCE_REFERENCE, "nginx-idler"),
            (METADATA_EXPECTED_STATE, "2"),
        ]);
        assert!(managed_workload_target(&meta, "2").is_none());
    }
}
