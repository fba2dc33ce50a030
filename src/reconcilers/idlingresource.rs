// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of `IdlingResource` objects.
//!
//! The reconcile sequence for every observed change:
//!
//! 1. Hold the finalizer before any side-effecting work, so a crash-restart
//!    cannot orphan annotations on the workload.
//! 2. Run the cron-strategy sub-reconciler.
//! 3. Resolve the referenced workload by kind. A missing workload requeues
//!    shortly (it may be created later) unless the `IdlingResource` is being
//!    deleted, in which case there is nothing to restore and the finalizer
//!    falls.
//! 4. Bind the workload to its per-kind idler and drive the state machine.
//!
//! Deletion is the one non-negotiable path: a user deleting an
//! `IdlingResource` intends to stop managing the workload, not to destroy
//! it. The workload is woken up and stripped of annotations before the
//! finalizer is removed; any failure keeps the finalizer and holds deletion.

use crate::constants::{
    IDLING_RESOURCE_FINALIZER, KIND_CRON_JOB, KIND_DEPLOYMENT, KIND_STATEFUL_SET,
    TARGET_REQUEUE_DURATION_SECS,
};
use crate::context::Context;
use crate::crd::IdlingResource;
use crate::idlers::{CronJobIdler, DeploymentIdler, Idler, StatefulSetIdler, WakeOutcome};
use crate::metrics;
use crate::reconcilers::cron_strategies::reconcile_cron_strategies;
use crate::reconcilers::finalizers::{ensure_finalizer, remove_finalizer};
use crate::reconcilers::is_not_found;
use anyhow::{Context as _, Result};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::CronJob;
use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Reconcile one `IdlingResource` toward its declared state.
///
/// # Errors
///
/// Errors bubble to the controller boundary and are requeued with backoff.
pub async fn reconcile_idlingresource(
    ctx: Arc<Context>,
    instance: Arc<IdlingResource>,
) -> Result<Action> {
    let namespace = instance
        .namespace()
        .context("IdlingResource has no namespace")?;

    // Finalizer first, before any side effect on the workload.
    match ensure_finalizer(&ctx.client, instance.as_ref(), IDLING_RESOURCE_FINALIZER).await {
        Ok(true) => {
            ctx.publish_normal(&instance, "Added", "Object finalizer is added".to_string())
                .await;
        }
        Ok(false) => {}
        Err(e) => {
            ctx.publish_warning(
                &instance,
                "Adding finalizer",
                format!("Failed to add finalizer: {e}"),
            )
            .await;
            return Err(e).context("error when adding finalizer");
        }
    }

    reconcile_cron_strategies(&ctx, &instance).await?;

    let reference = &instance.spec.idling_resource_ref;
    if reference.name.is_empty() {
        // Spec-level misconfiguration; nothing to manage, so deletion must
        // not be held either.
        debug!("empty workload reference, ignoring");
        if instance.is_being_deleted() {
            remove_finalizer(&ctx.client, instance.as_ref(), IDLING_RESOURCE_FINALIZER).await?;
        }
        return Ok(Action::await_change());
    }

    match reference.kind.as_str() {
        KIND_DEPLOYMENT => {
            match fetch_workload::<Deployment>(&ctx, &namespace, &reference.name).await? {
                Some(deployment) => {
                    let idler = DeploymentIdler::new(ctx.client.clone(), &namespace, deployment);
                    reconcile_with_idler(&ctx, &instance, &idler).await
                }
                None => target_absent(&ctx, &instance).await,
            }
        }
        KIND_STATEFUL_SET => {
            match fetch_workload::<StatefulSet>(&ctx, &namespace, &reference.name).await? {
                Some(statefulset) => {
                    let idler = StatefulSetIdler::new(ctx.client.clone(), &namespace, statefulset);
                    reconcile_with_idler(&ctx, &instance, &idler).await
                }
                None => target_absent(&ctx, &instance).await,
            }
        }
        KIND_CRON_JOB => {
            match fetch_workload::<CronJob>(&ctx, &namespace, &reference.name).await? {
                Some(cronjob) => {
                    let idler = CronJobIdler::new(ctx.client.clone(), &namespace, cronjob);
                    reconcile_with_idler(&ctx, &instance, &idler).await
                }
                None => target_absent(&ctx, &instance).await,
            }
        }
        other => {
            debug!(kind = other, "unsupported workload kind, ignoring");
            if instance.is_being_deleted() {
                remove_finalizer(&ctx.client, instance.as_ref(), IDLING_RESOURCE_FINALIZER)
                    .await?;
            }
            Ok(Action::await_change())
        }
    }
}

/// Fetch the referenced workload, mapping not-found to `None`.
async fn fetch_workload<T>(ctx: &Context, namespace: &str, name: &str) -> Result<Option<T>>
where
    T: kube::Resource<DynamicType = (), Scope = kube::core::NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + for<'de> serde::Deserialize<'de>,
{
    let api: Api<T> = Api::namespaced(ctx.client.clone(), namespace);
    match api.get(name).await {
        Ok(workload) => Ok(Some(workload)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(e).context("unable to read referenced workload"),
    }
}

/// Handle a missing referenced workload.
async fn target_absent(ctx: &Context, instance: &IdlingResource) -> Result<Action> {
    if instance.is_being_deleted() {
        // The workload is already gone; nothing to restore.
        remove_finalizer(&ctx.client, instance, IDLING_RESOURCE_FINALIZER).await?;
        return Ok(Action::await_change());
    }
    debug!(
        name = %instance.spec.idling_resource_ref.name,
        "referenced workload not found, requeueing"
    );
    Ok(Action::requeue(Duration::from_secs(
        TARGET_REQUEUE_DURATION_SECS,
    )))
}

fn wake_note(outcome: WakeOutcome) -> String {
    match outcome {
        WakeOutcome::ScaledTo(replicas) => format!("Scaled to {replicas}"),
        WakeOutcome::Resumed => "WakedUp".to_string(),
    }
}

fn restore_note(outcome: WakeOutcome) -> String {
    match outcome {
        WakeOutcome::ScaledTo(replicas) => format!("Restored to {replicas}"),
        WakeOutcome::Resumed => "WakedUp".to_string(),
    }
}

/// Drive the per-kind state machine for a resolved workload.
async fn reconcile_with_idler<I>(
    ctx: &Context,
    instance: &IdlingResource,
    idler: &I,
) -> Result<Action>
where
    I: Idler + Sync,
{
    let namespace = instance.namespace().unwrap_or_default();
    let instance_name = instance.name_any();
    let workload_name = &instance.spec.idling_resource_ref.name;

    // Mark the workload as managed; this also drives subsequent watch events.
    idler
        .set_reference(&instance_name)
        .await
        .context("error when adding reference annotation")?;

    if instance.is_being_deleted() {
        let restoring_reason = format!("Restoring{}", idler.kind());
        let outcome = match idler.wakeup().await {
            Ok(outcome) => outcome,
            Err(e) => {
                ctx.publish_warning(
                    instance,
                    &restoring_reason,
                    format!("Failed to restore {} {}: {}", idler.kind(), workload_name, e),
                )
                .await;
                return Err(e).context("error during restoring");
            }
        };
        metrics::record_wakeup_phase(idler.kind(), workload_name, &instance_name, &namespace);
        ctx.publish_normal(instance, &restoring_reason, restore_note(outcome))
            .await;

        if let Err(e) = idler.remove_annotations().await {
            ctx.publish_warning(
                instance,
                "Deleted",
                format!("Failed to remove annotations: {e}"),
            )
            .await;
            return Err(e).context("error when removing annotations");
        }
        ctx.publish_normal(
            instance,
            "Deleted",
            "Kidle annotations on workload are deleted".to_string(),
        )
        .await;

        if let Err(e) =
            remove_finalizer(&ctx.client, instance, IDLING_RESOURCE_FINALIZER).await
        {
            ctx.publish_warning(
                instance,
                "Deleted",
                format!("Failed to delete finalizer: {e}"),
            )
            .await;
            return Err(e).context("error when deleting finalizer");
        }
        ctx.publish_normal(instance, "Deleted", "Object finalizer is deleted".to_string())
            .await;
        return Ok(Action::await_change());
    }

    let scaling_reason = format!("Scaling{}", idler.kind());

    if idler.need_wakeup(instance) {
        let outcome = match idler.wakeup().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    workload = %workload_name,
                    error = %e,
                    "unable to wake up workload"
                );
                ctx.publish_warning(
                    instance,
                    &scaling_reason,
                    format!("Failed to wake up {} {}: {}", idler.kind(), workload_name, e),
                )
                .await;
                return Err(e).context("error during waking up");
            }
        };
        metrics::record_wakeup_phase(idler.kind(), workload_name, &instance_name, &namespace);
        ctx.publish_normal(instance, &scaling_reason, wake_note(outcome))
            .await;
        return Ok(Action::await_change());
    }

    if idler.need_idle(instance) {
        if let Err(e) = idler.idle().await {
            warn!(
                workload = %workload_name,
                error = %e,
                "unable to idle workload"
            );
            ctx.publish_warning(
                instance,
                &scaling_reason,
                format!("Failed to idle {} {}: {}", idler.kind(), workload_name, e),
            )
            .await;
            return Err(e).context("error during idling");
        }
        metrics::record_idle_phase(idler.kind(), workload_name, &instance_name, &namespace);
        ctx.publish_normal(instance, &scaling_reason, "Scaled to 0".to_string())
            .await;
        return Ok(Action::await_change());
    }

    Ok(Action::await_change())
}

#[cfg(test)]
#[path = "idlingresource_tests.rs"]
mod idlingresource_tests;
