// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Annotation-protocol helpers shared by all idlers.
//!
//! Concrete idlers delegate reference stamping and annotation teardown here
//! instead of each reimplementing the conflict-retried write. The helpers are
//! generic over the workload type; an idler passes its typed `Api` plus the
//! metadata of the workload it fetched.

use crate::annotations::{add_annotation, has_annotation, remove_annotation};
use crate::constants::{
    METADATA_EXPECTED_STATE, METADATA_IDLING_RESOURCE_REFERENCE, METADATA_PREVIOUS_REPLICAS,
};
use crate::reconcilers::retry::update_with_conflict_retry;
use anyhow::{Context as _, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Api, Resource};
use tracing::info;

/// Add the reference annotation naming the managing `IdlingResource`,
/// unless it is already present.
pub(crate) async fn set_reference<T>(
    api: &Api<T>,
    meta: &ObjectMeta,
    instance_name: &str,
) -> Result<()>
where
    T: Resource<DynamicType = ()>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if has_annotation(meta, METADATA_IDLING_RESOURCE_REFERENCE) {
        return Ok(());
    }

    let name = meta
        .name
        .clone()
        .context("workload has no name in metadata")?;
    info!(name = %name, "setting idling resource reference");

    update_with_conflict_retry(api, &name, |obj| {
        add_annotation(obj.meta_mut(), METADATA_IDLING_RESOURCE_REFERENCE, instance_name);
    })
    .await
    .context("unable to add reference in annotations")?;

    Ok(())
}

/// Strip every kidle annotation from the workload, if any is present.
/// `expected-state` is removed along with the others so a teardown-time
/// wakeup is not suppressed by the event predicate.
pub(crate) async fn remove_annotations<T>(api: &Api<T>, meta: &ObjectMeta) -> Result<()>
where
    T: Resource<DynamicType = ()>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if !has_annotation(meta, METADATA_IDLING_RESOURCE_REFERENCE)
        && !has_annotation(meta, METADATA_PREVIOUS_REPLICAS)
        && !has_annotation(meta, METADATA_EXPECTED_STATE)
    {
        return Ok(());
    }

    let name = meta
        .name
        .clone()
        .context("workload has no name in metadata")?;
    info!(name = %name, "removing kidle annotations");

    update_with_conflict_retry(api, &name, |obj| {
        remove_annotation(obj.meta_mut(), METADATA_IDLING_RESOURCE_REFERENCE);
        remove_annotation(obj.meta_mut(), METADATA_PREVIOUS_REPLICAS);
        remove_annotation(obj.meta_mut(), METADATA_EXPECTED_STATE);
    })
    .await
    .context("unable to remove kidle annotations")?;

    Ok(())
}

/// Parse the recorded previous replica count, defaulting to 1 when the
/// annotation is absent. An unparseable value is an error, not a default.
pub(crate) fn previous_replicas(meta: &ObjectMeta) -> Result<i32> {
    match crate::annotations::get_annotation(meta, METADATA_PREVIOUS_REPLICAS) {
        Some(value) => value.parse().with_context(|| {
            format!("invalid {METADATA_PREVIOUS_REPLICAS} annotation: {value:?}")
        }),
        None => Ok(1),
    }
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod object_tests;
