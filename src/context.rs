// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the controller.
//!
//! Every reconcile receives an `Arc<Context>` carrying the Kubernetes client,
//! the event recorder and the operator configuration resolved at startup.

use crate::crd::IdlingResource;
use kube::runtime::events::{Event, EventType, Recorder};
use kube::{Client, Resource};
use tracing::warn;

/// Shared context passed to the reconciler.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Publisher for typed Kubernetes events on `IdlingResource` objects
    pub recorder: Recorder,

    /// Container image used for the scheduled-actor CronJobs,
    /// resolved at startup
    pub cronjob_image: String,
}

impl Context {
    /// Publish a `Normal` event attached to the given `IdlingResource`.
    ///
    /// Events are informational; publish failures are logged and never fail
    /// the reconcile.
    pub async fn publish_normal(&self, ir: &IdlingResource, reason: &str, note: String) {
        self.publish(ir, EventType::Normal, reason, note).await;
    }

    /// Publish a `Warning` event attached to the given `IdlingResource`.
    pub async fn publish_warning(&self, ir: &IdlingResource, reason: &str, note: String) {
        self.publish(ir, EventType::Warning, reason, note).await;
    }

    async fn publish(&self, ir: &IdlingResource, type_: EventType, reason: &str, note: String) {
        let reference = ir.object_ref(&());
        let event = Event {
            type_,
            reason: reason.to_string(),
            note: Some(note),
            action: "Reconciling".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, &reference).await {
            warn!(error = %e, reason = reason, "unable to publish event");
        }
    }
}
