// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Idler for `Deployment` workloads.
//!
//! Idling scales `spec.replicas` to zero after recording the observed count
//! in the `previous-replicas` annotation; wakeup restores that count
//! (defaulting to 1 when no count was recorded). Every write also refreshes
//! the `expected-state` annotation so the event predicate can distinguish the
//! operator's own writes from external ones.

use crate::annotations::add_annotation;
use crate::constants::{
    KIND_DEPLOYMENT, METADATA_EXPECTED_STATE, METADATA_PREVIOUS_REPLICAS,
};
use crate::crd::IdlingResource;
use crate::idlers::object;
use crate::idlers::{Idler, WakeOutcome};
use crate::reconcilers::retry::update_with_conflict_retry;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

/// Binds a fetched `Deployment` to the idling contract.
pub struct DeploymentIdler {
    api: Api<Deployment>,
    deployment: Deployment,
}

impl DeploymentIdler {
    #[must_use]
    pub fn new(client: Client, namespace: &str, deployment: Deployment) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            deployment,
        }
    }
}

/// Declared replica count, nil treated as 1.
pub(crate) fn replicas(deployment: &Deployment) -> i32 {
    deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1)
}

/// True when the spec asks for idle but the deployment still has replicas.
#[must_use]
pub fn needs_idle(instance: &IdlingResource, deployment: &Deployment) -> bool {
    instance.spec.idle && replicas(deployment) > 0
}

/// True when the spec asks for running but the deployment is scaled to zero.
#[must_use]
pub fn needs_wakeup(instance: &IdlingResource, deployment: &Deployment) -> bool {
    !instance.spec.idle && replicas(deployment) == 0
}

#[async_trait]
impl Idler for DeploymentIdler {
    fn kind(&self) -> &'static str {
        KIND_DEPLOYMENT
    }

    fn need_idle(&self, instance: &IdlingResource) -> bool {
        needs_idle(instance, &self.deployment)
    }

    fn need_wakeup(&self, instance: &IdlingResource) -> bool {
        needs_wakeup(instance, &self.deployment)
    }

    async fn set_reference(&self, instance_name: &str) -> Result<()> {
        object::set_reference(&self.api, &self.deployment.metadata, instance_name).await
    }

    async fn remove_annotations(&self) -> Result<()> {
        object::remove_annotations(&self.api, &self.deployment.metadata).await
    }

    async fn idle(&self) -> Result<()> {
        if replicas(&self.deployment) == 0 {
            debug!(name = %self.deployment.name_any(), "deployment already idled");
            return Ok(());
        }

        let name = self.deployment.name_any();
        update_with_conflict_retry(&self.api, &name, |deployment: &mut Deployment| {
            let current = replicas(deployment);
            add_annotation(
                &mut deployment.metadata,
                METADATA_PREVIOUS_REPLICAS,
                &current.to_string(),
            );
            add_annotation(&mut deployment.metadata, METADATA_EXPECTED_STATE, "0");
            if let Some(spec) = deployment.spec.as_mut() {
                spec.replicas = Some(0);
            }
        })
        .await
        .context("unable to downscale deployment")?;

        debug!(name = %name, "deployment idled");
        Ok(())
    }

    async fn wakeup(&self) -> Result<WakeOutcome> {
        let previous = object::previous_replicas(&self.deployment.metadata)?;

        if replicas(&self.deployment) == previous {
            debug!(name = %self.deployment.name_any(), "deployment already waked up");
            return Ok(WakeOutcome::ScaledTo(previous));
        }

        let name = self.deployment.name_any();
        update_with_conflict_retry(&self.api, &name, |deployment: &mut Deployment| {
            add_annotation(
                &mut deployment.metadata,
                METADATA_EXPECTED_STATE,
                &previous.to_string(),
            );
            if let Some(spec) = deployment.spec.as_mut() {
                spec.replicas = Some(previous);
            }
        })
        .await
        .context("unable to wakeup deployment")?;

        debug!(name = %name, replicas = previous, "deployment waked up");
        Ok(WakeOutcome::ScaledTo(previous))
    }
}

#[cfg(test)]
#[path = "deployment_tests.rs"]
mod deployment_tests;
