// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for the Kidle operator.
//!
//! The operator runs a single controller over `IdlingResource` objects.
//! Each reconcile converges the referenced workload toward the declared
//! run/idle state and keeps the scheduled-actor bundle in sync with the
//! declared cron strategies.
//!
//! # Modules
//!
//! - [`idlingresource`] - the reconcile entry point and per-kind dispatch
//! - [`cron_strategies`] - scheduled-actor bundle (RBAC + CronJobs)
//! - [`finalizers`] - generic finalizer add/remove helpers
//! - [`retry`] - conflict-retried writes with exponential backoff

pub mod cron_strategies;
pub mod finalizers;
pub mod idlingresource;
pub mod retry;

pub use cron_strategies::reconcile_cron_strategies;
pub use idlingresource::reconcile_idlingresource;

/// Determine whether a Kubernetes API error is a not-found response.
#[must_use]
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == 404)
}
