// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Watch-event filtering for managed workloads.
//!
//! The reconciler writes to the workloads it manages, and every such write
//! comes back as a watch event. Without a filter this would loop forever:
//! reconcile, write, event, reconcile. The filter closes the loop using the
//! `expected-state` annotation, the operator's own declaration of what it
//! last wrote:
//!
//! - Workloads without the reference annotation are not managed; drop.
//! - When the observed state (replicas or suspend, rendered as a string)
//!   equals `expected-state`, the event is the echo of the operator's own
//!   write; drop.
//! - When they differ, a user or another controller moved the workload away
//!   from the declared state and a reconcile must re-assert it; enqueue.
//!
//! `IdlingResource` events themselves always enqueue and do not pass through
//! this filter.

use crate::annotations::{get_annotation, has_annotation};
use crate::constants::{METADATA_EXPECTED_STATE, METADATA_IDLING_RESOURCE_REFERENCE};
use crate::crd::IdlingResource;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::runtime::reflector::ObjectRef;

/// Render the observable run state of a replicated workload. Nil replicas are
/// treated as 1, matching the Deployment and StatefulSet defaults.
#[must_use]
pub fn replicas_state(replicas: Option<i32>) -> String {
    replicas.unwrap_or(1).to_string()
}

/// Render the observable run state of a scheduled workload. Nil suspend is
/// treated as false, matching the CronJob default.
#[must_use]
pub fn suspend_state(suspend: Option<bool>) -> String {
    suspend.unwrap_or(false).to_string()
}

/// Decide whether an update to a managed workload warrants a reconcile.
///
/// Enqueue iff the workload carries the reference annotation, the
/// `expected-state` annotation is present, and the observed state differs
/// from it.
#[must_use]
pub fn should_enqueue(meta: &ObjectMeta, observed: &str) -> bool {
    if !has_annotation(meta, METADATA_IDLING_RESOURCE_REFERENCE) {
        return false;
    }
    match get_annotation(meta, METADATA_EXPECTED_STATE) {
        Some(expected) => expected != observed,
        None => false,
    }
}

/// Map a workload event to the `IdlingResource` that manages it, applying
/// [`should_enqueue`]. Returns `None` when the event must be dropped.
#[must_use]
pub fn managed_workload_target(meta: &ObjectMeta, observed: &str) -> Option<ObjectRef<IdlingResource>> {
    if !should_enqueue(meta, observed) {
        return None;
    }
    let ir_name = get_annotation(meta, METADATA_IDLING_RESOURCE_REFERENCE)?;
    let namespace = meta.namespace.as_deref()?;
    Some(ObjectRef::new(ir_name).within(namespace))
}

#[cfg(test)]
#[path = "predicate_tests.rs"]
mod predicate_tests;
