// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{routing::get, Router};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::CronJob;
use kidle::{
    constants::{
        CRONJOB_IMAGE_ENV, DEFAULT_CRONJOB_IMAGE, DEFAULT_LEASE_DURATION_SECS,
        DEFAULT_LEASE_RETRY_PERIOD_SECS, ERROR_REQUEUE_DURATION_SECS, METRICS_SERVER_BIND_ADDRESS,
        METRICS_SERVER_PATH, METRICS_SERVER_PORT, TOKIO_WORKER_THREADS,
    },
    context::Context,
    crd::IdlingResource,
    metrics, predicate,
    reconcilers::reconcile_idlingresource,
};
use kube::runtime::events::{Recorder, Reporter};
use kube::runtime::{controller::Action, watcher::Config, Controller};
use kube::{Api, Client, ResourceExt};
use kube_lease_manager::{LeaseManager, LeaseManagerBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("kidle-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting Kidle operator");
}

/// Build the shared context: client, event recorder and startup config.
async fn initialize_context() -> Result<Arc<Context>> {
    debug!("Initializing Kubernetes client");
    let config = kube::Config::infer().await?;
    let client = Client::try_from(config)?;
    info!("Kubernetes client initialized");

    let reporter = Reporter {
        controller: "kidle-controller".to_string(),
        instance: std::env::var("POD_NAME").ok(),
    };
    let recorder = Recorder::new(client.clone(), reporter);

    let cronjob_image =
        std::env::var(CRONJOB_IMAGE_ENV).unwrap_or_else(|_| DEFAULT_CRONJOB_IMAGE.to_string());
    info!(image = %cronjob_image, "Scheduled-actor CronJob image resolved");

    Ok(Arc::new(Context {
        client,
        recorder,
        cronjob_image,
    }))
}

/// Start the Prometheus metrics HTTP server
///
/// Serves metrics on the configured port and path (default: 0.0.0.0:8080/metrics)
///
/// # Returns
/// A `JoinHandle` that can be used to monitor the server task
fn start_metrics_server() -> tokio::task::JoinHandle<()> {
    info!(
        bind_address = METRICS_SERVER_BIND_ADDRESS,
        port = METRICS_SERVER_PORT,
        path = METRICS_SERVER_PATH,
        "Starting Prometheus metrics HTTP server"
    );

    tokio::spawn(async move {
        // Define the metrics endpoint handler
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("Failed to gather metrics: {}", e);
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        // Build the router with the metrics endpoint
        let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));

        // Bind to the configured address and port
        let bind_addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind metrics server to {bind_addr}: {e}");
                return;
            }
        };

        info!("Metrics server listening on http://{bind_addr}{METRICS_SERVER_PATH}");

        // Run the server
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {e}");
        }
    })
}

/// Leader election configuration
struct LeaderElectionConfig {
    enabled: bool,
    lease_name: String,
    lease_namespace: String,
    identity: String,
    lease_duration: u64,
    retry_period: u64,
}

/// Load leader election configuration from environment variables
fn load_leader_election_config() -> LeaderElectionConfig {
    let enabled = std::env::var("KIDLE_ENABLE_LEADER_ELECTION")
        .unwrap_or_else(|_| "true".to_string())
        .parse::<bool>()
        .unwrap_or(true);

    let lease_name =
        std::env::var("KIDLE_LEASE_NAME").unwrap_or_else(|_| "kidle-leader".to_string());

    let lease_namespace = std::env::var("KIDLE_LEASE_NAMESPACE")
        .or_else(|_| std::env::var("POD_NAMESPACE"))
        .unwrap_or_else(|_| "kidle-system".to_string());

    let lease_duration = std::env::var("KIDLE_LEASE_DURATION_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_DURATION_SECS);

    let retry_period = std::env::var("KIDLE_LEASE_RETRY_PERIOD_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_RETRY_PERIOD_SECS);

    let identity = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("kidle-{}", rand::random::<u32>()));

    LeaderElectionConfig {
        enabled,
        lease_name,
        lease_namespace,
        identity,
        lease_duration,
        retry_period,
    }
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let context = initialize_context().await?;
    let client = context.client.clone();

    // Start the metrics HTTP server
    let _metrics_handle = start_metrics_server();

    let leader_election_config = load_leader_election_config();

    if leader_election_config.enabled {
        info!(
            lease_name = %leader_election_config.lease_name,
            lease_namespace = %leader_election_config.lease_namespace,
            identity = %leader_election_config.identity,
            lease_duration_secs = leader_election_config.lease_duration,
            "Leader election enabled"
        );

        info!("Starting leader election, waiting to acquire leadership...");

        let lease_manager =
            LeaseManagerBuilder::new(client.clone(), &leader_election_config.lease_name)
                .with_namespace(&leader_election_config.lease_namespace)
                .with_identity(&leader_election_config.identity)
                .with_duration(leader_election_config.lease_duration)
                .with_grace(leader_election_config.retry_period)
                .build()
                .await?;

        let (leader_rx, lease_handle) = lease_manager.watch().await;

        // Wait until we become leader
        let mut rx = leader_rx.clone();
        while !*rx.borrow_and_update() {
            rx.changed().await?;
        }

        info!("Leadership acquired, starting controller...");

        run_operator_with_leader_election(context, leader_rx, lease_handle).await?;
    } else {
        warn!("Leader election DISABLED - running without high availability");
        run_operator_with_signals(context).await?;
    }

    Ok(())
}

/// Monitor leadership status - returns when leadership is lost or an error occurs
async fn monitor_leadership(
    mut leader_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), anyhow::Error> {
    loop {
        leader_rx.changed().await?;
        if !*leader_rx.borrow() {
            // Leadership lost
            return Ok(());
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            result.map_err(anyhow::Error::from)
        }
        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                // On non-Unix platforms, just wait forever
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            result
        }
    }
}

/// Run the operator until a shutdown signal arrives.
async fn run_operator_with_signals(context: Arc<Context>) -> Result<()> {
    let shutdown_result: Result<()> = tokio::select! {
        result = shutdown_signal() => result,
        result = run_operator(context) => {
            error!("CRITICAL: IdlingResource operator exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("IdlingResource operator exited unexpectedly without error")
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully");
    Ok(())
}

/// Run the operator while monitoring leadership status and signals.
///
/// If leadership is lost or SIGTERM/SIGINT is received, the operator stops
/// and the process exits gracefully.
async fn run_operator_with_leader_election(
    context: Arc<Context>,
    leader_rx: tokio::sync::watch::Receiver<bool>,
    _lease_handle: tokio::task::JoinHandle<
        Result<LeaseManager, kube_lease_manager::LeaseManagerError>,
    >,
) -> Result<()> {
    let shutdown_result: Result<()> = tokio::select! {
        result = shutdown_signal() => {
            info!("Stopping operator and releasing leader election lease...");
            result
        }
        result = monitor_leadership(leader_rx) => {
            match result {
                Ok(()) => {
                    warn!("Leadership lost! Stopping operator...");
                    anyhow::bail!("Leadership lost - stepping down")
                }
                Err(e) => {
                    error!("Leadership monitor error: {:?}", e);
                    anyhow::bail!("Leadership monitoring failed: {e}")
                }
            }
        }
        result = run_operator(context) => {
            error!("CRITICAL: IdlingResource operator exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("IdlingResource operator exited unexpectedly without error")
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully, leader election lease released");
    Ok(())
}

/// Run the `IdlingResource` operator.
///
/// The controller watches `IdlingResource` objects plus the three supported
/// workload kinds. Workload events pass through the expected-state predicate,
/// which maps them to the managing `IdlingResource` only when an external
/// actor moved the workload away from the state the operator last wrote.
async fn run_operator(context: Arc<Context>) -> Result<()> {
    info!("Starting IdlingResource operator");

    let client = context.client.clone();
    let api = Api::<IdlingResource>::all(client.clone());
    let deployment_api = Api::<Deployment>::all(client.clone());
    let statefulset_api = Api::<StatefulSet>::all(client.clone());
    let cronjob_api = Api::<CronJob>::all(client.clone());

    Controller::new(api, Config::default())
        .watches(deployment_api, Config::default(), |deployment: Deployment| {
            let observed =
                predicate::replicas_state(deployment.spec.as_ref().and_then(|s| s.replicas));
            predicate::managed_workload_target(&deployment.metadata, &observed)
        })
        .watches(
            statefulset_api,
            Config::default(),
            |statefulset: StatefulSet| {
                let observed =
                    predicate::replicas_state(statefulset.spec.as_ref().and_then(|s| s.replicas));
                predicate::managed_workload_target(&statefulset.metadata, &observed)
            },
        )
        .watches(cronjob_api, Config::default(), |cronjob: CronJob| {
            let observed = predicate::suspend_state(cronjob.spec.as_ref().and_then(|s| s.suspend));
            predicate::managed_workload_target(&cronjob.metadata, &observed)
        })
        .run(reconcile_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `IdlingResource`
async fn reconcile_wrapper(
    instance: Arc<IdlingResource>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = std::time::Instant::now();

    debug!(
        name = %instance.name_any(),
        namespace = ?instance.namespace(),
        "Reconcile wrapper called for IdlingResource"
    );

    let result = Box::pin(reconcile_idlingresource(ctx, instance.clone())).await;
    let duration = start.elapsed();

    match result {
        Ok(action) => {
            debug!(
                "Successfully reconciled IdlingResource: {}",
                instance.name_any()
            );
            metrics::record_reconciliation_success(duration);
            Ok(action)
        }
        Err(e) => {
            error!("Failed to reconcile IdlingResource: {}", e);
            metrics::record_reconciliation_error(duration);
            Err(e.into())
        }
    }
}

/// Error policy for the controller.
///
/// Returns an action to requeue the resource after a delay when reconciliation fails.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy(
    instance: Arc<IdlingResource>,
    err: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    error!(
        error = %err,
        name = %instance.name_any(),
        "Reconciliation error - will retry in {}s",
        ERROR_REQUEUE_DURATION_SECS
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}
