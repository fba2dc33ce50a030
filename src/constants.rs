// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Kidle operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the Kidle CRD
pub const API_GROUP: &str = "kidle.kidle.dev";

/// API version for the Kidle CRD
pub const API_VERSION: &str = "v1beta1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "kidle.kidle.dev/v1beta1";

/// Kind name for the `IdlingResource` resource
pub const KIND_IDLING_RESOURCE: &str = "IdlingResource";

/// Plural resource name for `IdlingResource`
pub const IDLING_RESOURCES: &str = "idlingresources";

/// Kind name for referenced `Deployment` workloads
pub const KIND_DEPLOYMENT: &str = "Deployment";

/// Kind name for referenced `StatefulSet` workloads
pub const KIND_STATEFUL_SET: &str = "StatefulSet";

/// Kind name for referenced `CronJob` workloads
pub const KIND_CRON_JOB: &str = "CronJob";

// ============================================================================
// Finalizer
// ============================================================================

/// Finalizer held on every `IdlingResource` until its workload has been
/// restored and stripped of kidle annotations. Stable across releases.
pub const IDLING_RESOURCE_FINALIZER: &str = "idlingresource.finalizers.kidle.kidle.dev";

// ============================================================================
// Workload Annotations
// ============================================================================

/// Annotation naming the `IdlingResource` that manages a workload.
/// Its presence marks the workload as managed.
pub const METADATA_IDLING_RESOURCE_REFERENCE: &str = "kidle.kidle.dev/idling-resource-reference";

/// Annotation recording the replica count observed at the moment of idling,
/// restored on wakeup.
pub const METADATA_PREVIOUS_REPLICAS: &str = "kidle.kidle.dev/previous-replicas";

/// Annotation recording the authoritative value last written by the operator
/// (replica count as string, or "true"/"false" for suspend). Used to suppress
/// reconciliation of the operator's own writes.
pub const METADATA_EXPECTED_STATE: &str = "kidle.kidle.dev/expected-state";

// ============================================================================
// Scheduled-Actor Bundle Constants
// ============================================================================

/// Name prefix for all per-`IdlingResource` scheduled-actor objects
pub const BUNDLE_NAME_PREFIX: &str = "kidle";

/// Container name inside the idle/wakeup `CronJob` pods
pub const CRONJOB_CONTAINER_NAME: &str = "kidlectl";

/// Default container image for the idle/wakeup `CronJob` pods
pub const DEFAULT_CRONJOB_IMAGE: &str = "kidle/kidlectl:latest";

/// Environment variable overriding the `CronJob` container image at startup
pub const CRONJOB_IMAGE_ENV: &str = "KIDLE_CRONJOB_IMAGE";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration while a referenced workload does not exist yet (2 seconds)
pub const TARGET_REQUEUE_DURATION_SECS: u64 = 2;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election retry period (2 seconds)
pub const DEFAULT_LEASE_RETRY_PERIOD_SECS: u64 = 2;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
