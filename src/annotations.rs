// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Annotation helpers for Kubernetes object metadata.
//!
//! The idling protocol is carried entirely through annotations on managed
//! workloads, so every reconciler path goes through these helpers rather than
//! touching the annotation map directly.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Create or update an annotation. The annotation map is initialized if absent.
pub fn add_annotation(meta: &mut ObjectMeta, annotation: &str, value: &str) {
    meta.annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(annotation.to_string(), value.to_string());
}

/// Remove an annotation if present.
pub fn remove_annotation(meta: &mut ObjectMeta, annotation: &str) {
    if let Some(annotations) = meta.annotations.as_mut() {
        annotations.remove(annotation);
    }
}

/// Safely return an annotation value if it exists.
#[must_use]
pub fn get_annotation<'a>(meta: &'a ObjectMeta, annotation: &str) -> Option<&'a str> {
    meta.annotations
        .as_ref()
        .and_then(|annotations| annotations.get(annotation))
        .map(String::as_str)
}

/// Safely check whether an annotation exists.
#[must_use]
pub fn has_annotation(meta: &ObjectMeta, annotation: &str) -> bool {
    meta.annotations
        .as_ref()
        .is_some_and(|annotations| annotations.contains_key(annotation))
}

#[cfg(test)]
#[path = "annotations_tests.rs"]
mod annotations_tests;
