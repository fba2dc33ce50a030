// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        CronStrategy, CrossVersionObjectReference, IdlingResource, IdlingResourceSpec,
        IdlingStrategy, WakeupStrategy,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
    use kube::CustomResourceExt;

    fn test_spec() -> IdlingResourceSpec {
        IdlingResourceSpec {
            idling_resource_ref: CrossVersionObjectReference {
                kind: "Deployment".to_string(),
                name: "nginx".to_string(),
                api_version: Some("apps/v1".to_string()),
            },
            idle: false,
            idling_strategy: None,
            wakeup_strategy: None,
        }
    }

    #[test]
    fn test_crd_identity() {
        let crd = IdlingResource::crd();
        assert_eq!(
            crd.metadata.name.as_deref(),
            Some("idlingresources.kidle.kidle.dev")
        );
        assert_eq!(crd.spec.group, "kidle.kidle.dev");
        assert_eq!(crd.spec.names.kind, "IdlingResource");
        assert_eq!(
            crd.spec.names.short_names,
            Some(vec!["ir".to_string()])
        );
    }

    #[test]
    fn test_spec_serializes_camel_case() {
        let json = serde_json::to_value(test_spec()).unwrap();
        assert!(json.get("idlingResourceRef").is_some());
        assert_eq!(json["idlingResourceRef"]["apiVersion"], "apps/v1");
        assert_eq!(json["idle"], false);
        // Absent strategies are omitted from the wire form
        assert!(json.get("idlingStrategy").is_none());
        assert!(json.get("wakeupStrategy").is_none());
    }

    #[test]
    fn test_idle_defaults_to_false() {
        let spec: IdlingResourceSpec = serde_json::from_value(serde_json::json!({
            "idlingResourceRef": { "kind": "CronJob", "name": "hello" }
        }))
        .unwrap();
        assert!(!spec.idle);
        assert_eq!(spec.idling_resource_ref.api_version, None);
    }

    #[test]
    fn test_is_being_deleted() {
        let mut instance = IdlingResource::new("nginx-idler", test_spec());
        assert!(!instance.is_being_deleted());

        instance.metadata.deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
        assert!(instance.is_being_deleted());
    }

    #[test]
    fn test_cron_strategy_accessors() {
        let mut spec = test_spec();
        let mut instance = IdlingResource::new("nginx-idler", spec.clone());
        assert!(!instance.has_cron_strategy());
        assert!(instance.idle_cron_strategy().is_none());

        spec.idling_strategy = Some(IdlingStrategy {
            cron_strategy: Some(CronStrategy {
                schedule: "*/5 * * * *".to_string(),
            }),
            inactive_strategy: None,
        });
        instance = IdlingResource::new("nginx-idler", spec.clone());
        assert!(instance.has_cron_strategy());
        assert_eq!(
            instance.idle_cron_strategy().map(|s| s.schedule.as_str()),
            Some("*/5 * * * *")
        );
        assert!(instance.wakeup_cron_strategy().is_none());

        spec.idling_strategy = None;
        spec.wakeup_strategy = Some(WakeupStrategy {
            cron_strategy: Some(CronStrategy {
                schedule: "0 8 * * 1-5".to_string(),
            }),
            on_call_strategy: None,
        });
        instance = IdlingResource::new("nginx-idler", spec);
        assert!(instance.has_cron_strategy());
        assert!(instance.idle_cron_strategy().is_none());
        assert_eq!(
            instance.wakeup_cron_strategy().map(|s| s.schedule.as_str()),
            Some("0 8 * * 1-5")
        );
    }

    #[test]
    fn test_declared_only_strategies_round_trip() {
        // InactiveStrategy and OnCallStrategy are declared in the type
        // surface without reconciliation semantics; they must still survive
        // serialization.
        let json = serde_json::json!({
            "idlingResourceRef": { "kind": "Deployment", "name": "nginx" },
            "idle": true,
            "idlingStrategy": { "inactiveStrategy": {} },
            "wakeupStrategy": { "onCallStrategy": {} }
        });
        let spec: IdlingResourceSpec = serde_json::from_value(json).unwrap();
        assert!(spec.idling_strategy.unwrap().inactive_strategy.is_some());
        assert!(spec.wakeup_strategy.unwrap().on_call_strategy.is_some());
    }

    #[test]
    fn test_manual_metadata_construction() {
        let instance = IdlingResource {
            metadata: ObjectMeta {
                name: Some("nginx-idler".to_string()),
                namespace: Some("default".to_string()),
                ..ObjectMeta::default()
            },
            spec: test_spec(),
            status: None,
        };
        assert_eq!(instance.metadata.namespace.as_deref(), Some("default"));
    }
}
