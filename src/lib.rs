// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Kidle - Workload Idling Operator for Kubernetes
//!
//! Kidle is a Kubernetes operator written in Rust that idles and wakes
//! scalable workloads on demand or on schedule, driven by `IdlingResource`
//! custom objects.
//!
//! ## Overview
//!
//! For each `IdlingResource` the operator observes the referenced workload
//! and converges it toward the declared state:
//!
//! - Deployments and StatefulSets are scaled to zero and later restored to
//!   their previous replica count
//! - CronJobs are suspended and resumed
//!
//! Declared cron strategies are materialized as in-cluster scheduled actors:
//! a `CronJob` invoking the `kidlectl` CLI under a dedicated, least-privileged
//! `ServiceAccount`, so schedules keep working across operator restarts.
//!
//! ## Modules
//!
//! - [`crd`] - the `IdlingResource` custom resource definition
//! - [`idlers`] - per-kind convergence state machines
//! - [`reconcilers`] - the control loop and the cron-strategy sub-reconciler
//! - [`predicate`] - watch-event filtering for managed workloads
//! - [`client`] - the client used by the `kidlectl` CLI
//!
//! ## Example
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
//!     idle: false,
//!     idling_strategy: None,
//!     wakeup_strategy: None,
//! };
//! ```

pub mod annotations;
pub mod client;
pub mod constants;
pub mod context;
pub mod crd;
pub mod idlers;
pub mod metrics;
pub mod names;
pub mod predicate;
pub mod reconcilers;

#[cfg(test)]
mod crd_tests;
