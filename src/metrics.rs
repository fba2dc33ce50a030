// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Kidle operator.
//!
//! All metrics live in a process-global registry and are exposed over the
//! `/metrics` endpoint of the operator's HTTP server.
//!
//! # Metrics Categories
//!
//! - **Phase Metrics** - Count idle and wakeup transitions per managed workload
//! - **Reconciliation Metrics** - Track reconciliation outcomes and duration
//!
//! # Example
//!
//! ```rust,no_run
//! use kidle::metrics::record_idle_phase;
//!
//! record_idle_phase("Deployment", "nginx", "nginx-idler", "default");
//! ```

use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all Kidle metrics
const METRICS_NAMESPACE: &str = "kidle";

/// Labels shared by the phase counters: the workload kind and name, the
/// managing `IdlingResource` and the namespace.
const PHASE_LABELS: [&str; 4] = ["kind", "name", "idlingresource", "namespace"];

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Number of idle phases per managed workload
pub static IDLE_PHASE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_idle_phase_total"),
        "Number of idle phase",
    );
    let counter = CounterVec::new(opts, &PHASE_LABELS).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of wakeup phases per managed workload
pub static WAKEUP_PHASE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_wakeup_phase_total"),
        "Number of wakeup phase",
    );
    let counter = CounterVec::new(opts, &PHASE_LABELS).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of reconciliations by outcome
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Record an idle transition for a managed workload
///
/// # Arguments
/// * `kind` - Kind of the workload (e.g., `Deployment`)
/// * `name` - Name of the workload
/// * `idlingresource` - Name of the managing `IdlingResource`
/// * `namespace` - Namespace of both objects
pub fn record_idle_phase(kind: &str, name: &str, idlingresource: &str, namespace: &str) {
    IDLE_PHASE_TOTAL
        .with_label_values(&[kind, name, idlingresource, namespace])
        .inc();
}

/// Record a wakeup transition for a managed workload
///
/// # Arguments
/// * `kind` - Kind of the workload (e.g., `CronJob`)
/// * `name` - Name of the workload
/// * `idlingresource` - Name of the managing `IdlingResource`
/// * `namespace` - Namespace of both objects
pub fn record_wakeup_phase(kind: &str, name: &str, idlingresource: &str, namespace: &str) {
    WAKEUP_PHASE_TOTAL
        .with_label_values(&[kind, name, idlingresource, namespace])
        .inc();
}

/// Record a successful reconciliation
pub fn record_reconciliation_success(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["success"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["error"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_idle_phase() {
        record_idle_phase("Deployment", "nginx", "nginx-idler", "default");

        let counter =
            IDLE_PHASE_TOTAL.with_label_values(&["Deployment", "nginx", "nginx-idler", "default"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_wakeup_phase() {
        record_wakeup_phase("CronJob", "hello", "hello-idler", "default");

        let counter =
            WAKEUP_PHASE_TOTAL.with_label_values(&["CronJob", "hello", "hello-idler", "default"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_reconciliation_outcomes() {
        record_reconciliation_success(Duration::from_millis(500));
        record_reconciliation_error(Duration::from_millis(250));

        assert!(
            RECONCILIATION_TOTAL
                .with_label_values(&["success"])
                .get()
                > 0.0
        );
        assert!(RECONCILIATION_TOTAL.with_label_values(&["error"]).get() > 0.0);
        assert!(RECONCILIATION_DURATION_SECONDS.get_sample_count() > 0);
    }

    #[test]
    fn test_gather_metrics() {
        record_idle_phase("Deployment", "gather", "gather-idler", "default");

        let result = gather_metrics();
        assert!(result.is_ok(), "Gathering metrics should succeed");

        let metrics_text = result.unwrap();
        assert!(
            metrics_text.contains("kidle_idle_phase_total"),
            "Metrics should contain the idle phase counter"
        );
    }
}
