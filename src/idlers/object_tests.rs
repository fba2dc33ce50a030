// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the shared idler helpers

#[cfg(test)]
mod tests {
    use crate::constants::METADATA_PREVIOUS_REPLICAS;
    use crate::idlers::object::previous_replicas;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn meta_with_previous(value: Option<&str>) -> ObjectMeta {
        let annotations = value.map(|v| {
            let mut map = BTreeMap::new();
            map.insert(METADATA_PREVIOUS_REPLICAS.to_string(), v.to_string());
            map
        });
        ObjectMeta {
            name: Some("nginx".to_string()),
            annotations,
            ..ObjectMeta::default()
        }
    }

    #[test]
    fn test_previous_replicas_defaults_to_one() {
        assert_eq!(previous_replicas(&meta_with_previous(None)).unwrap(), 1);
    }

    #[test]
    fn test_previous_replicas_parses_recorded_count() {
        assert_eq!(previous_replicas(&meta_with_previous(Some("7"))).unwrap(), 7);
        assert_eq!(previous_replicas(&meta_with_previous(Some("0"))).unwrap(), 0);
    }

    #[test]
    fn test_unparseable_previous_replicas_is_an_error() {
        // A corrupted annotation must surface, not silently default.
        let result = previous_replicas(&meta_with_previous(Some("not-a-number")));
        assert!(result.is_err());
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("previous-replicas"));
    }
}
