// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Idler for `CronJob` workloads.
//!
//! A cron schedule has no replica count to preserve; idling suspends the
//! schedule and wakeup resumes it. `expected-state` carries "true"/"false"
//! so the event predicate applies uniformly across workload kinds.

use crate::annotations::add_annotation;
use crate::constants::{KIND_CRON_JOB, METADATA_EXPECTED_STATE};
use crate::crd::IdlingResource;
use crate::idlers::object;
use crate::idlers::{Idler, WakeOutcome};
use crate::reconcilers::retry::update_with_conflict_retry;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::CronJob;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

/// Binds a fetched `CronJob` to the idling contract.
pub struct CronJobIdler {
    api: Api<CronJob>,
    cronjob: CronJob,
}

impl CronJobIdler {
    #[must_use]
    pub fn new(client: Client, namespace: &str, cronjob: CronJob) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            cronjob,
        }
    }
}

/// Declared suspend flag, nil treated as false.
pub(crate) fn suspended(cronjob: &CronJob) -> bool {
    cronjob
        .spec
        .as_ref()
        .and_then(|s| s.suspend)
        .unwrap_or(false)
}

/// True when the spec asks for idle but the schedule still runs.
#[must_use]
pub fn needs_idle(instance: &IdlingResource, cronjob: &CronJob) -> bool {
    instance.spec.idle && !suspended(cronjob)
}

/// True when the spec asks for running but the schedule is suspended.
#[must_use]
pub fn needs_wakeup(instance: &IdlingResource, cronjob: &CronJob) -> bool {
    !instance.spec.idle && suspended(cronjob)
}

#[async_trait]
impl Idler for CronJobIdler {
    fn kind(&self) -> &'static str {
        KIND_CRON_JOB
    }

    fn need_idle(&self, instance: &IdlingResource) -> bool {
        needs_idle(instance, &self.cronjob)
    }

    fn need_wakeup(&self, instance: &IdlingResource) -> bool {
        needs_wakeup(instance, &self.cronjob)
    }

    async fn set_reference(&self, instance_name: &str) -> Result<()> {
        object::set_reference(&self.api, &self.cronjob.metadata, instance_name).await
    }

    async fn remove_annotations(&self) -> Result<()> {
        object::remove_annotations(&self.api, &self.cronjob.metadata).await
    }

    async fn idle(&self) -> Result<()> {
        if suspended(&self.cronjob) {
            debug!(name = %self.cronjob.name_any(), "cronjob already suspended");
            return Ok(());
        }

        let name = self.cronjob.name_any();
        update_with_conflict_retry(&self.api, &name, |cronjob: &mut CronJob| {
            add_annotation(&mut cronjob.metadata, METADATA_EXPECTED_STATE, "true");
            if let Some(spec) = cronjob.spec.as_mut() {
                spec.suspend = Some(true);
            }
        })
        .await
        .context("unable to suspend cronjob")?;

        debug!(name = %name, "cronjob suspended");
        Ok(())
    }

    async fn wakeup(&self) -> Result<WakeOutcome> {
        if !suspended(&self.cronjob) {
            debug!(name = %self.cronjob.name_any(), "cronjob already resumed");
            return Ok(WakeOutcome::Resumed);
        }

        let name = self.cronjob.name_any();
        update_with_conflict_retry(&self.api, &name, |cronjob: &mut CronJob| {
            add_annotation(&mut cronjob.metadata, METADATA_EXPECTED_STATE, "false");
            if let Some(spec) = cronjob.spec.as_mut() {
                spec.suspend = Some(false);
            }
        })
        .await
        .context("unable to resume cronjob")?;

        debug!(name = %name, "cronjob resumed");
        Ok(WakeOutcome::Resumed)
    }
}

#[cfg(test)]
#[path = "cronjob_tests.rs"]
mod cronjob_tests;
