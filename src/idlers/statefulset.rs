// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Idler for `StatefulSet` workloads.
//!
//! Same convergence as [`super::deployment`]: scale to zero on idle with the
//! previous count recorded, restore the recorded count on wakeup.

use crate::annotations::add_annotation;
use crate::constants::{
    KIND_STATEFUL_SET, METADATA_EXPECTED_STATE, METADATA_PREVIOUS_REPLICAS,
};
use crate::crd::IdlingResource;
use crate::idlers::object;
use crate::idlers::{Idler, WakeOutcome};
use crate::reconcilers::retry::update_with_conflict_retry;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

/// Binds a fetched `StatefulSet` to the idling contract.
pub struct StatefulSetIdler {
    api: Api<StatefulSet>,
    statefulset: StatefulSet,
}

impl StatefulSetIdler {
    #[must_use]
    pub fn new(client: Client, namespace: &str, statefulset: StatefulSet) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            statefulset,
        }
    }
}

/// Declared replica count, nil treated as 1.
pub(crate) fn replicas(statefulset: &StatefulSet) -> i32 {
    statefulset
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1)
}

/// True when the spec asks for idle but the statefulset still has replicas.
#[must_use]
pub fn needs_idle(instance: &IdlingResource, statefulset: &StatefulSet) -> bool {
    instance.spec.idle && replicas(statefulset) > 0
}

/// True when the spec asks for running but the statefulset is scaled to zero.
#[must_use]
pub fn needs_wakeup(instance: &IdlingResource, statefulset: &StatefulSet) -> bool {
    !instance.spec.idle && replicas(statefulset) == 0
}

#[async_trait]
impl Idler for StatefulSetIdler {
    fn kind(&self) -> &'static str {
        KIND_STATEFUL_SET
    }

    fn need_idle(&self, instance: &IdlingResource) -> bool {
        needs_idle(instance, &self.statefulset)
    }

    fn need_wakeup(&self, instance: &IdlingResource) -> bool {
        needs_wakeup(instance, &self.statefulset)
    }

    async fn set_reference(&self, instance_name: &str) -> Result<()> {
        object::set_reference(&self.api, &self.statefulset.metadata, instance_name).await
    }

    async fn remove_annotations(&self) -> Result<()> {
        object::remove_annotations(&self.api, &self.statefulset.metadata).await
    }

    async fn idle(&self) -> Result<()> {
        if replicas(&self.statefulset) == 0 {
            debug!(name = %self.statefulset.name_any(), "statefulset already idled");
            return Ok(());
        }

        let name = self.statefulset.name_any();
        update_with_conflict_retry(&self.api, &name, |statefulset: &mut StatefulSet| {
            let current = replicas(statefulset);
            add_annotation(
                &mut statefulset.metadata,
                METADATA_PREVIOUS_REPLICAS,
                &current.to_string(),
            );
            add_annotation(&mut statefulset.metadata, METADATA_EXPECTED_STATE, "0");
            if let Some(spec) = statefulset.spec.as_mut() {
                spec.replicas = Some(0);
            }
        })
        .await
        .context("unable to downscale statefulset")?;

        debug!(name = %name, "statefulset idled");
        Ok(())
    }

    async fn wakeup(&self) -> Result<WakeOutcome> {
        let previous = object::previous_replicas(&self.statefulset.metadata)?;

        if replicas(&self.statefulset) == previous {
            debug!(name = %self.statefulset.name_any(), "statefulset already waked up");
            return Ok(WakeOutcome::ScaledTo(previous));
        }

        let name = self.statefulset.name_any();
        update_with_conflict_retry(&self.api, &name, |statefulset: &mut StatefulSet| {
            add_annotation(
                &mut statefulset.metadata,
                METADATA_EXPECTED_STATE,
                &previous.to_string(),
            );
            if let Some(spec) = statefulset.spec.as_mut() {
                spec.replicas = Some(previous);
            }
        })
        .await
        .context("unable to wakeup statefulset")?;

        debug!(name = %name, replicas = previous, "statefulset waked up");
        Ok(WakeOutcome::ScaledTo(previous))
    }
}

#[cfg(test)]
#[path = "statefulset_tests.rs"]
mod statefulset_tests;
