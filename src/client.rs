// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes client for the `kidlectl` CLI.
//!
//! A thin client over the `IdlingResource` API: flip the desired idle state,
//! create new resources, and validate workload kinds against what the
//! cluster's discovery endpoint actually serves.

use crate::constants::{KIND_CRON_JOB, KIND_DEPLOYMENT, KIND_STATEFUL_SET};
use crate::crd::{CrossVersionObjectReference, IdlingResource, IdlingResourceSpec};
use anyhow::{bail, Context as _, Result};
use kube::api::PostParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::Discovery;
use kube::{Api, Client, Config};
use std::collections::BTreeSet;
use std::path::Path;

/// Workload plurals the CLI accepts as idle-able, looked up in the `apps`
/// and `batch` API groups.
pub const ALLOWED_WORKLOAD_PLURALS: [&str; 3] = ["deployments", "statefulsets", "cronjobs"];

/// API groups searched for idle-able workload kinds.
const ALLOWED_API_GROUPS: [&str; 2] = ["apps", "batch"];

/// Client bound to one namespace, the way `kubectl` resolves it: an explicit
/// flag wins, otherwise the current context's namespace.
pub struct KidleClient {
    pub client: Client,
    pub namespace: String,
}

impl KidleClient {
    /// Connect using the given kubeconfig path or the inferred environment
    /// (in-cluster config or `$KUBECONFIG`).
    ///
    /// # Errors
    ///
    /// Returns an error when the kubeconfig cannot be read or the client
    /// cannot be constructed.
    pub async fn new(namespace: Option<String>, kubeconfig: Option<&Path>) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("unable to read kubeconfig {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .context("unable to load kubeconfig")?
            }
            None => Config::infer().await.context("unable to infer config")?,
        };

        let namespace = namespace.unwrap_or_else(|| config.default_namespace.clone());
        let client = Client::try_from(config).context("unable to create client")?;

        Ok(Self { client, namespace })
    }

    /// Make sure the named `IdlingResource` has the desired idling state.
    ///
    /// Returns `false` when the current state already matches (no write is
    /// issued), `true` when the state was updated.
    ///
    /// # Errors
    ///
    /// Returns an error when the resource cannot be read or updated.
    pub async fn apply_desired_idle_state(&self, idle: bool, name: &str) -> Result<bool> {
        let api: Api<IdlingResource> = Api::namespaced(self.client.clone(), &self.namespace);
        let mut instance = api
            .get(name)
            .await
            .context("unable to get idlingresource")?;

        if instance.spec.idle == idle {
            return Ok(false);
        }

        instance.spec.idle = idle;
        api.replace(name, &PostParams::default(), &instance)
            .await
            .context("unable to update idlingresource")?;
        Ok(true)
    }

    /// Create an `IdlingResource` for the given `<kind>/<name>` workload
    /// reference, after validating the kind against cluster discovery.
    ///
    /// # Errors
    ///
    /// Returns an error when the reference is malformed, the kind is not an
    /// allowed workload kind, or the create call fails.
    pub async fn create_idling_resource(
        &self,
        idle: bool,
        reference: &str,
        name: &str,
    ) -> Result<()> {
        let (kind, workload_name) = parse_workload_ref(reference)?;

        let allowed = self.allowed_resources().await?;
        if !allowed.contains(&kind.to_lowercase()) {
            let expected = allowed.into_iter().collect::<Vec<_>>().join(", ");
            bail!("invalid resource kind; got `{kind}` expected one of: {expected}");
        }

        let spec = IdlingResourceSpec {
            idling_resource_ref: workload_reference(kind, workload_name),
            idle,
            idling_strategy: None,
            wakeup_strategy: None,
        };

        let api: Api<IdlingResource> = Api::namespaced(self.client.clone(), &self.namespace);
        api.create(&PostParams::default(), &IdlingResource::new(name, spec))
            .await
            .context("unable to create idling resource")?;
        Ok(())
    }

    /// Names accepted for idle-able workload kinds, gathered from cluster
    /// discovery: plural, singular and shortnames of the allowed resources.
    ///
    /// # Errors
    ///
    /// Returns an error when discovery against the API server fails.
    pub async fn allowed_resources(&self) -> Result<BTreeSet<String>> {
        let discovery = Discovery::new(self.client.clone())
            .filter(&ALLOWED_API_GROUPS)
            .run()
            .await
            .context("unable to run discovery")?;

        let mut allowed = BTreeSet::new();
        for group in discovery.groups() {
            for (resource, capabilities) in group.recommended_resources() {
                if !ALLOWED_WORKLOAD_PLURALS.contains(&resource.plural.as_str()) {
                    continue;
                }
                allowed.insert(resource.plural.clone());
                allowed.insert(resource.kind.to_lowercase());
                for shortname in &capabilities.shortnames {
                    allowed.insert(shortname.clone());
                }
            }
        }
        Ok(allowed)
    }
}

/// Split a `<kind>/<name>` workload reference.
///
/// # Errors
///
/// Returns an error when no `/` separator is present.
pub fn parse_workload_ref(reference: &str) -> Result<(&str, &str)> {
    reference
        .split_once('/')
        .filter(|(kind, name)| !kind.is_empty() && !name.is_empty())
        .with_context(|| format!("invalid idlingresource ref; expected <kind>/<name> got {reference}"))
}

/// Build the spec reference for a validated workload kind, canonicalizing
/// aliases (plural, singular, shortname) to the kind the reconciler honors.
#[must_use]
pub fn workload_reference(kind: &str, name: &str) -> CrossVersionObjectReference {
    let (canonical_kind, api_version) = match kind.to_lowercase().as_str() {
        "deployments" | "deployment" | "deploy" => (KIND_DEPLOYMENT, "apps/v1"),
        "statefulsets" | "statefulset" | "sts" => (KIND_STATEFUL_SET, "apps/v1"),
        "cronjobs" | "cronjob" | "cj" => (KIND_CRON_JOB, "batch/v1"),
        _ => (kind, "apps/v1"),
    };
    CrossVersionObjectReference {
        kind: canonical_kind.to_string(),
        name: name.to_string(),
        api_version: Some(api_version.to_string()),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
