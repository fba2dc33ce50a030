// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-kind idling state machines.
//!
//! An idler binds a fetched workload to the six-operation convergence
//! contract the reconciler drives: stamp the management reference, decide
//! whether the workload needs idling or waking, perform the transition, and
//! strip the protocol annotations on teardown.
//!
//! Three idlers exist, one per supported workload kind:
//!
//! - [`DeploymentIdler`] - scales `spec.replicas` between 0 and the recorded
//!   previous count
//! - [`StatefulSetIdler`] - same convergence as deployments
//! - [`CronJobIdler`] - toggles `spec.suspend`
//!
//! Every operation is idempotent: a workload already in the desired state is
//! left untouched, which makes arbitrary replay by the controller or by users
//! safe.

pub mod cronjob;
pub mod deployment;
pub mod object;
pub mod statefulset;

pub use cronjob::CronJobIdler;
pub use deployment::DeploymentIdler;
pub use statefulset::StatefulSetIdler;

use crate::crd::IdlingResource;
use anyhow::Result;
use async_trait::async_trait;

/// Outcome of a wakeup transition, pattern-matched by the event emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeOutcome {
    /// A replicated workload was scaled back to this replica count.
    ScaledTo(i32),
    /// A scheduled workload had its schedule resumed; no count applies.
    Resumed,
}

/// The convergence contract between the reconciler and a workload kind.
#[async_trait]
pub trait Idler {
    /// Kind of the bound workload, used in events and metrics.
    fn kind(&self) -> &'static str;

    /// True when the spec asks for idle but the workload still runs.
    fn need_idle(&self, instance: &IdlingResource) -> bool;

    /// True when the spec asks for running but the workload is idled.
    fn need_wakeup(&self, instance: &IdlingResource) -> bool;

    /// Idempotently stamp the workload with the reference annotation naming
    /// the managing `IdlingResource`.
    async fn set_reference(&self, instance_name: &str) -> Result<()>;

    /// Idempotently strip all kidle annotations from the workload. The
    /// `expected-state` annotation is removed too, so that the teardown
    /// wakeup write is not filtered by the event predicate.
    async fn remove_annotations(&self) -> Result<()>;

    /// Drive the workload to its idle state, recording the previous state.
    async fn idle(&self) -> Result<()>;

    /// Drive the workload back to its running state.
    async fn wakeup(&self) -> Result<WakeOutcome>;
}
