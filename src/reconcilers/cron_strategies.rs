// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Materialization of cron strategies as in-cluster scheduled actors.
//!
//! A declared cron strategy does not run inside the operator process.
//! Instead, for every `IdlingResource` with at least one cron strategy the
//! operator maintains a bundle of cluster objects:
//!
//! - a `ServiceAccount` the scheduled pods run under
//! - a `Role` granting {get, patch, update} on exactly this one
//!   `IdlingResource`
//! - a `RoleBinding` connecting the two
//! - one `CronJob` per declared strategy, running `kidlectl <verb> <name>`
//!
//! Every bundle object is owned by the `IdlingResource`, so cluster garbage
//! collection removes the bundle when the resource disappears. Strategies
//! removed from the spec have their `CronJob` deleted on the next reconcile.
//!
//! The `Role` rule set is refreshed on every reconcile, healing drift.
//! `RoleBinding` drift is not healed; only creation is handled.

use crate::constants::{
    API_GROUP, BUNDLE_NAME_PREFIX, CRONJOB_CONTAINER_NAME, IDLING_RESOURCES,
};
use crate::context::Context;
use crate::crd::IdlingResource;
use crate::names::to_dns_name;
use crate::reconcilers::is_not_found;
use anyhow::{Context as _, Result};
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, ServiceAccount};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Resource, ResourceExt};
use tracing::{debug, info};

/// The verb a scheduled actor invokes against its `IdlingResource`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CronVerb {
    Idle,
    Wakeup,
}

impl CronVerb {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CronVerb::Idle => "idle",
            CronVerb::Wakeup => "wakeup",
        }
    }
}

/// Derived name of a bundle object for the given `IdlingResource` name.
#[must_use]
pub fn bundle_name(instance_name: &str, suffix: &str) -> String {
    to_dns_name(BUNDLE_NAME_PREFIX, instance_name, suffix)
}

/// Ensure the scheduled-actor bundle matches the declared cron strategies.
///
/// Runs on every reconcile. With no strategy declared, the bundle is
/// deleted (best-effort, absence is fine). With at least one strategy, RBAC
/// is ensured first and a `CronJob` per declared strategy is created or
/// updated; the `CronJob` of a removed strategy is deleted.
///
/// # Errors
///
/// Returns an error when any bundle object cannot be read, created, updated
/// or deleted (404 on delete excepted).
pub async fn reconcile_cron_strategies(ctx: &Context, instance: &IdlingResource) -> Result<()> {
    let idle_strategy = instance.idle_cron_strategy();
    let wakeup_strategy = instance.wakeup_cron_strategy();

    if idle_strategy.is_none() && wakeup_strategy.is_none() {
        return delete_actor_bundle(ctx, instance).await;
    }

    if let Err(e) = ensure_rbac(ctx, instance).await {
        ctx.publish_warning(instance, "Adding RBAC", format!("Failed to add RBAC: {e}"))
            .await;
        return Err(e).context("error when adding RBAC");
    }

    match idle_strategy {
        Some(strategy) => ensure_cronjob(ctx, instance, CronVerb::Idle, &strategy.schedule).await?,
        None => delete_cronjob(ctx, instance, CronVerb::Idle).await?,
    }

    match wakeup_strategy {
        Some(strategy) => {
            ensure_cronjob(ctx, instance, CronVerb::Wakeup, &strategy.schedule).await?;
        }
        None => delete_cronjob(ctx, instance, CronVerb::Wakeup).await?,
    }

    Ok(())
}

/// The single policy rule granted to a scheduled actor: {get, patch, update}
/// on exactly this `IdlingResource`.
#[must_use]
pub fn desired_policy_rule(instance_name: &str) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![API_GROUP.to_string()]),
        resources: Some(vec![IDLING_RESOURCES.to_string()]),
        resource_names: Some(vec![instance_name.to_string()]),
        verbs: vec!["get".to_string(), "patch".to_string(), "update".to_string()],
        ..PolicyRule::default()
    }
}

fn owner_reference(instance: &IdlingResource) -> Result<OwnerReference> {
    instance
        .controller_owner_ref(&())
        .context("IdlingResource has no name for owner reference")
}

fn bundle_metadata(
    name: String,
    namespace: &str,
    owner: &OwnerReference,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(namespace.to_string()),
        owner_references: Some(vec![owner.clone()]),
        ..ObjectMeta::default()
    }
}

/// Ensure the `ServiceAccount`, `Role` and `RoleBinding` of the bundle.
async fn ensure_rbac(ctx: &Context, instance: &IdlingResource) -> Result<()> {
    let namespace = instance
        .namespace()
        .context("IdlingResource has no namespace")?;
    let instance_name = instance.name_any();
    let owner = owner_reference(instance)?;

    let sa_name = bundle_name(&instance_name, "sa");
    let sa_api: Api<ServiceAccount> = Api::namespaced(ctx.client.clone(), &namespace);
    match sa_api.get(&sa_name).await {
        Ok(_) => {}
        Err(e) if is_not_found(&e) => {
            let sa = ServiceAccount {
                metadata: bundle_metadata(sa_name.clone(), &namespace, &owner),
                ..ServiceAccount::default()
            };
            sa_api.create(&PostParams::default(), &sa).await?;
            info!("Created ServiceAccount {}/{}", namespace, sa_name);
        }
        Err(e) => return Err(e).context("unable to get service account"),
    }

    let role_name = bundle_name(&instance_name, "role");
    let role_api: Api<Role> = Api::namespaced(ctx.client.clone(), &namespace);
    let desired_rule = desired_policy_rule(&instance_name);
    match role_api.get(&role_name).await {
        Ok(mut role) => {
            // Overwrite rule 0 on every pass so a drifted rule set is healed.
            let mut rules = role.rules.take().unwrap_or_default();
            if rules.first() == Some(&desired_rule) {
                debug!("Role {}/{} rules are up to date", namespace, role_name);
            } else {
                if rules.is_empty() {
                    rules.push(desired_rule);
                } else {
                    rules[0] = desired_rule;
                }
                role.rules = Some(rules);
                role_api
                    .replace(&role_name, &PostParams::default(), &role)
                    .await?;
                info!("Updated Role {}/{} rules", namespace, role_name);
            }
        }
        Err(e) if is_not_found(&e) => {
            let role = Role {
                metadata: bundle_metadata(role_name.clone(), &namespace, &owner),
                rules: Some(vec![desired_rule]),
            };
            role_api.create(&PostParams::default(), &role).await?;
            info!("Created Role {}/{}", namespace, role_name);
        }
        Err(e) => return Err(e).context("unable to get role"),
    }

    let rb_name = bundle_name(&instance_name, "rb");
    let rb_api: Api<RoleBinding> = Api::namespaced(ctx.client.clone(), &namespace);
    match rb_api.get(&rb_name).await {
        Ok(_) => {}
        Err(e) if is_not_found(&e) => {
            let rb = RoleBinding {
                metadata: bundle_metadata(rb_name.clone(), &namespace, &owner),
                role_ref: RoleRef {
                    api_group: "rbac.authorization.k8s.io".to_string(),
                    kind: "Role".to_string(),
                    name: role_name.clone(),
                },
                subjects: Some(vec![Subject {
                    kind: "ServiceAccount".to_string(),
                    name: sa_name.clone(),
                    namespace: Some(namespace.clone()),
                    ..Subject::default()
                }]),
            };
            rb_api.create(&PostParams::default(), &rb).await?;
            info!("Created RoleBinding {}/{}", namespace, rb_name);
        }
        Err(e) => return Err(e).context("unable to get rolebinding"),
    }

    Ok(())
}

/// Ensure the `CronJob` for one declared strategy, healing drift in place.
async fn ensure_cronjob(
    ctx: &Context,
    instance: &IdlingResource,
    verb: CronVerb,
    schedule: &str,
) -> Result<()> {
    let namespace = instance
        .namespace()
        .context("IdlingResource has no namespace")?;
    let instance_name = instance.name_any();
    let cj_name = bundle_name(&instance_name, verb.as_str());
    let sa_name = bundle_name(&instance_name, "sa");
    let api: Api<CronJob> = Api::namespaced(ctx.client.clone(), &namespace);

    match api.get(&cj_name).await {
        Ok(mut existing) => {
            if need_cronjob_values(
                &existing,
                verb,
                schedule,
                &ctx.cronjob_image,
                &sa_name,
                &instance_name,
            ) {
                set_cronjob_values(
                    &mut existing,
                    verb,
                    schedule,
                    &ctx.cronjob_image,
                    &sa_name,
                    &instance_name,
                );
                api.replace(&cj_name, &PostParams::default(), &existing)
                    .await?;
                info!("Updated CronJob {}/{}", namespace, cj_name);
            } else {
                debug!("CronJob {}/{} is up to date", namespace, cj_name);
            }
        }
        Err(e) if is_not_found(&e) => {
            let reason = format!("Creating {} CronJob", verb.as_str());
            let owner = owner_reference(instance)?;
            let mut cronjob = CronJob {
                metadata: bundle_metadata(cj_name.clone(), &namespace, &owner),
                ..CronJob::default()
            };
            set_cronjob_values(
                &mut cronjob,
                verb,
                schedule,
                &ctx.cronjob_image,
                &sa_name,
                &instance_name,
            );

            if let Err(e) = api.create(&PostParams::default(), &cronjob).await {
                ctx.publish_warning(instance, &reason, format!("Failed to create CronJob: {e}"))
                    .await;
                return Err(e).context("unable to create cronjob");
            }
            ctx.publish_normal(instance, &reason, format!("Created CronJob {cj_name}"))
                .await;
            info!("Created CronJob {}/{}", namespace, cj_name);
        }
        Err(e) => return Err(e).context("unable to get cronjob"),
    }

    Ok(())
}

/// Delete the `CronJob` of a removed strategy. Absence is fine.
async fn delete_cronjob(ctx: &Context, instance: &IdlingResource, verb: CronVerb) -> Result<()> {
    let namespace = instance
        .namespace()
        .context("IdlingResource has no namespace")?;
    let cj_name = bundle_name(&instance.name_any(), verb.as_str());
    let api: Api<CronJob> = Api::namespaced(ctx.client.clone(), &namespace);

    match api.delete(&cj_name, &DeleteParams::default()).await {
        Ok(_) => {
            let reason = format!("Deleting {} CronJob", verb.as_str());
            ctx.publish_normal(instance, &reason, format!("Deleted CronJob {cj_name}"))
                .await;
            info!("Deleted CronJob {}/{}", namespace, cj_name);
            Ok(())
        }
        Err(e) if is_not_found(&e) => Ok(()),
        Err(e) => Err(e).context("unable to delete cronjob"),
    }
}

/// Delete the whole scheduled-actor bundle. Absence of any piece is fine.
async fn delete_actor_bundle(ctx: &Context, instance: &IdlingResource) -> Result<()> {
    let namespace = instance
        .namespace()
        .context("IdlingResource has no namespace")?;
    let instance_name = instance.name_any();

    delete_cronjob(ctx, instance, CronVerb::Idle).await?;
    delete_cronjob(ctx, instance, CronVerb::Wakeup).await?;

    let rb_api: Api<RoleBinding> = Api::namespaced(ctx.client.clone(), &namespace);
    delete_ignoring_absent(&rb_api, &bundle_name(&instance_name, "rb")).await?;

    let role_api: Api<Role> = Api::namespaced(ctx.client.clone(), &namespace);
    delete_ignoring_absent(&role_api, &bundle_name(&instance_name, "role")).await?;

    let sa_api: Api<ServiceAccount> = Api::namespaced(ctx.client.clone(), &namespace);
    delete_ignoring_absent(&sa_api, &bundle_name(&instance_name, "sa")).await?;

    Ok(())
}

async fn delete_ignoring_absent<T>(api: &Api<T>, name: &str) -> Result<()>
where
    T: Clone + std::fmt::Debug + for<'de> serde::Deserialize<'de>,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(e) if is_not_found(&e) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Locate the actor container inside a `CronJob` pod template.
fn actor_container(cronjob: &CronJob) -> Option<&Container> {
    cronjob
        .spec
        .as_ref()?
        .job_template
        .spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers
        .iter()
        .find(|c| c.name == CRONJOB_CONTAINER_NAME)
}

fn pod_spec(cronjob: &CronJob) -> Option<&PodSpec> {
    cronjob
        .spec
        .as_ref()?
        .job_template
        .spec
        .as_ref()?
        .template
        .spec
        .as_ref()
}

/// Compare an existing `CronJob` against the desired values.
///
/// Drift in any of: suspend flag, schedule, service account, container image
/// or container args (exact length and element equality) triggers an
/// overwrite update.
#[must_use]
pub fn need_cronjob_values(
    cronjob: &CronJob,
    verb: CronVerb,
    schedule: &str,
    image: &str,
    service_account_name: &str,
    instance_name: &str,
) -> bool {
    let Some(spec) = cronjob.spec.as_ref() else {
        return true;
    };
    if spec.suspend != Some(false) {
        return true;
    }
    if spec.schedule != schedule {
        return true;
    }

    if pod_spec(cronjob).and_then(|p| p.service_account_name.as_deref()) != Some(service_account_name)
    {
        return true;
    }

    let Some(container) = actor_container(cronjob) else {
        return true;
    };
    if container.image.as_deref() != Some(image) {
        return true;
    }

    let expected_args = [verb.as_str(), instance_name];
    match container.args.as_ref() {
        Some(args) => args.len() != expected_args.len()
            || args.iter().zip(expected_args.iter()).any(|(a, e)| a != e),
        None => true,
    }
}

/// Overwrite the managed fields of a `CronJob` with the desired values.
pub fn set_cronjob_values(
    cronjob: &mut CronJob,
    verb: CronVerb,
    schedule: &str,
    image: &str,
    service_account_name: &str,
    instance_name: &str,
) {
    let container = Container {
        name: CRONJOB_CONTAINER_NAME.to_string(),
        image: Some(image.to_string()),
        args: Some(vec![verb.as_str().to_string(), instance_name.to_string()]),
        ..Container::default()
    };

    let spec = cronjob.spec.get_or_insert_with(CronJobSpec::default);
    spec.suspend = Some(false);
    spec.schedule = schedule.to_string();

    let job_spec = spec.job_template.spec.get_or_insert_with(JobSpec::default);
    let template_spec = job_spec.template.spec.get_or_insert_with(PodSpec::default);
    template_spec.restart_policy = Some("OnFailure".to_string());
    template_spec.service_account_name = Some(service_account_name.to_string());
    template_spec.containers = vec![container];
}

#[cfg(test)]
#[path = "cron_strategies_tests.rs"]
mod cron_strategies_tests;
