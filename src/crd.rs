// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definition for workload idling.
//!
//! This module defines the `IdlingResource` custom resource, the single control
//! object reconciled by the Kidle operator. An `IdlingResource` declares that a
//! referenced workload (Deployment, StatefulSet or CronJob) should be running
//! or idled, optionally on a cron schedule.
//!
//! # Example: Idling a Deployment
//!
//! ```rust,no_run
//! use kidle::crd::{CrossVersionObjectReference, IdlingResourceSpec};
//!
//! let spec = IdlingResourceSpec {
//!     idling_resource_ref: CrossVersionObjectReference {
//!         kind: "Deployment".to_string(),
//!         name: "nginx".to_string(),
//!         api_version: Some("apps/v1".to_string()),
//!     },
//!     idle: true,
//!     idling_strategy: None,
//!     wakeup_strategy: None,
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference identifying the workload an `IdlingResource` manages.
///
/// The referent must live in the same namespace as the `IdlingResource`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrossVersionObjectReference {
    /// Kind of the referent. One of `Deployment`, `StatefulSet` or `CronJob`
    /// is honored; other kinds are ignored by the reconciler.
    pub kind: String,

    /// Name of the referent.
    pub name: String,

    /// API version of the referent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Cron-scheduled idling or wakeup.
///
/// Declaring a cron strategy makes the operator materialize a scheduled actor
/// (a `CronJob` running `kidlectl` under a dedicated, least-privileged
/// `ServiceAccount`) that flips the desired state at the scheduled times.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CronStrategy {
    /// The schedule in Cron format, see <https://en.wikipedia.org/wiki/Cron>.
    pub schedule: String,
}

/// Strategy for reaching the idle state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdlingStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_strategy: Option<CronStrategy>,

    /// Declared but not reconciled. Reserved for traffic-based inactivity
    /// detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive_strategy: Option<InactiveStrategy>,
}

/// Placeholder strategy with no reconciliation behavior.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InactiveStrategy {}

/// Strategy for reaching the running state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WakeupStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_strategy: Option<CronStrategy>,

    /// Declared but not reconciled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_call_strategy: Option<OnCallStrategy>,
}

/// Placeholder strategy with no reconciliation behavior.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OnCallStrategy {}

/// `IdlingResource` declares the desired run/idle state of a workload.
#[derive(CustomResource, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kidle.kidle.dev",
    version = "v1beta1",
    kind = "IdlingResource",
    namespaced,
    shortname = "ir",
    doc = "IdlingResource declares that a referenced workload should be idled or running, possibly on a cron schedule. Replicated workloads are scaled to zero and restored to their previous replica count; scheduled workloads are suspended and resumed.",
    printcolumn = r#"{"name":"Idle","type":"boolean","jsonPath":".spec.idle"}"#,
    printcolumn = r#"{"name":"RefKind","type":"string","jsonPath":".spec.idlingResourceRef.kind"}"#,
    printcolumn = r#"{"name":"RefName","type":"string","jsonPath":".spec.idlingResourceRef.name"}"#
)]
#[kube(status = "IdlingResourceStatus")]
#[serde(rename_all = "camelCase")]
pub struct IdlingResourceSpec {
    /// The reference to the idle-able workload, in the same namespace.
    pub idling_resource_ref: CrossVersionObjectReference,

    /// The desired state of idling. Defaults to false.
    #[serde(default)]
    pub idle: bool,

    /// Optional strategy carrying the declared idle schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idling_strategy: Option<IdlingStrategy>,

    /// Optional strategy carrying the declared wakeup schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wakeup_strategy: Option<WakeupStrategy>,
}

/// Observed state of an `IdlingResource`.
///
/// Reserved for future observed-state reporting; not used by the core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdlingResourceStatus {}

impl IdlingResource {
    /// Returns true if a deletion timestamp is set.
    #[must_use]
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// The declared idle cron strategy, if any.
    #[must_use]
    pub fn idle_cron_strategy(&self) -> Option<&CronStrategy> {
        self.spec
            .idling_strategy
            .as_ref()
            .and_then(|s| s.cron_strategy.as_ref())
    }

    /// The declared wakeup cron strategy, if any.
    #[must_use]
    pub fn wakeup_cron_strategy(&self) -> Option<&CronStrategy> {
        self.spec
            .wakeup_strategy
            .as_ref()
            .and_then(|s| s.cron_strategy.as_ref())
    }

    /// True when at least one cron strategy is declared in the spec.
    #[must_use]
    pub fn has_cron_strategy(&self) -> bool {
        self.idle_cron_strategy().is_some() || self.wakeup_cron_strategy().is_some()
    }
}
