// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `client.rs`

#[cfg(test)]
mod tests {
    use crate::client::{parse_workload_ref, workload_reference, ALLOWED_WORKLOAD_PLURALS};

    #[test]
    fn test_parse_workload_ref() {
        assert_eq!(
            parse_workload_ref("Deployment/nginx").unwrap(),
            ("Deployment", "nginx")
        );
        assert_eq!(
            parse_workload_ref("cronjobs/hello").unwrap(),
            ("cronjobs", "hello")
        );
    }

    #[test]
    fn test_parse_workload_ref_rejects_malformed_input() {
        assert!(parse_workload_ref("nginx").is_err());
        assert!(parse_workload_ref("/nginx").is_err());
        assert!(parse_workload_ref("Deployment/").is_err());
    }

    #[test]
    fn test_workload_reference_canonicalizes_aliases() {
        for alias in ["deployments", "deployment", "deploy", "Deployment"] {
            let reference = workload_reference(alias, "nginx");
            assert_eq!(reference.kind, "Deployment");
            assert_eq!(reference.api_version.as_deref(), Some("apps/v1"));
        }

        let reference = workload_reference("sts", "db");
        assert_eq!(reference.kind, "StatefulSet");
        assert_eq!(reference.api_version.as_deref(), Some("apps/v1"));

        let reference = workload_reference("cj", "hello");
        assert_eq!(reference.kind, "CronJob");
        assert_eq!(reference.api_version.as_deref(), Some("batch/v1"));
    }

    #[test]
    fn test_workload_reference_keeps_name() {
        let reference = workload_reference("cronjob", "hello");
        assert_eq!(reference.name, "hello");
    }

    #[test]
    fn test_allowed_plurals() {
        assert_eq!(
            ALLOWED_WORKLOAD_PLURALS,
            ["deployments", "statefulsets", "cronjobs"]
        );
    }
}
