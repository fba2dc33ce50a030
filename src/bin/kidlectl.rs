// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! kidlectl - CLI frontend for the Kidle operator.
//!
//! A thin client over the `IdlingResource` custom-object API:
//!
//! - `idle <name>` / `wakeup <name>` flip the desired idling state
//! - `create <name> --ref <kind>/<target> [--idle]` declares a new resource
//! - `version` prints the build version
//!
//! Exit codes: 0 success, 1 flag/usage error, 2 client construction failure,
//! 3 operation failure.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use kidle::client::KidleClient;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info};

/// Flag/usage error
const EXIT_USAGE: i32 = 1;
/// Client construction failure
const EXIT_CLIENT: i32 = 2;
/// Operation failure
const EXIT_OPERATION: i32 = 3;

#[derive(Parser)]
#[command(
    name = "kidlectl",
    version,
    about = "Control the idling state of Kubernetes workloads"
)]
struct Cli {
    /// Path to Kubernetes config file
    #[arg(long, global = true, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// IdlingResource namespace (defaults to the current context's namespace)
    #[arg(long, short = 'n', global = true, env = "NAMESPACE")]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Idle the referenced object of an IdlingResource
    #[command(alias = "i")]
    Idle {
        /// Idling resource name to idle
        name: String,
    },
    /// Wakeup the referenced object of an IdlingResource
    #[command(alias = "w")]
    Wakeup {
        /// Idling resource name to wakeup
        name: String,
    },
    /// Create an IdlingResource
    #[command(alias = "c")]
    Create {
        /// Idling resource name to create
        name: String,
        /// The reference to the idle-able workload, as <kind>/<name>
        #[arg(long, short = 'r', value_name = "KIND/NAME")]
        r#ref: String,
        /// The desired state of idling, defaults to false
        #[arg(long, short = 'i')]
        idle: bool,
    },
    /// Show the kidle version information
    Version,
}

fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not usage errors
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = e.print();
                return;
            }
            let _ = e.print();
            exit(EXIT_USAGE);
        }
    };

    initialize_logging();

    if let Command::Version = cli.command {
        println!("kidlectl {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let client = match KidleClient::new(cli.namespace.clone(), cli.kubeconfig.as_deref()).await {
        Ok(client) => client,
        Err(e) => {
            error!("unable to create kidle client: {e:#}");
            exit(EXIT_CLIENT);
        }
    };

    match cli.command {
        Command::Idle { name } => {
            info!(
                namespace = %client.namespace,
                name = %name,
                "idling the referenced object"
            );
            match client.apply_desired_idle_state(true, &name).await {
                Ok(true) => info!("done"),
                Ok(false) => info!("already idled"),
                Err(e) => {
                    error!("unable to idle: {e:#}");
                    exit(EXIT_OPERATION);
                }
            }
        }
        Command::Wakeup { name } => {
            info!(
                namespace = %client.namespace,
                name = %name,
                "waking up the referenced object"
            );
            match client.apply_desired_idle_state(false, &name).await {
                Ok(true) => info!("done"),
                Ok(false) => info!("already waked up"),
                Err(e) => {
                    error!("unable to wakeup: {e:#}");
                    exit(EXIT_OPERATION);
                }
            }
        }
        Command::Create { name, r#ref, idle } => {
            info!(
                namespace = %client.namespace,
                name = %name,
                reference = %r#ref,
                "creating the idling resource"
            );
            if let Err(e) = client.create_idling_resource(idle, &r#ref, &name).await {
                error!("unable to create: {e:#}");
                exit(EXIT_OPERATION);
            }
            info!("created");
        }
        Command::Version => unreachable!("handled above"),
    }
}
