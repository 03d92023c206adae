//! # rotctl
//!
//! Command-line interface for the Secret Rotator operator.
//!
//! ```bash
//! # List SecretRotation resources
//! rotctl list
//!
//! # Show the status of one resource
//! rotctl status orders-db --namespace payments
//!
//! # Force a rotation on the next reconciliation
//! rotctl rotate orders-db --namespace payments
//!
//! # Pause and resume rotation
//! rotctl suspend orders-db -n payments
//! rotctl resume orders-db -n payments
//!
//! # Print a password from the same generator the operator uses
//! rotctl generate --length 32 --symbols
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;

mod generate;
mod list;
mod rotate;
mod status;
mod suspend;

/// Secret Rotator CLI
#[derive(Parser)]
#[command(name = "rotctl")]
#[command(
    about = "Secret Rotator CLI",
    long_about = None,
    after_help = "\
Examples:
  rotctl list
  rotctl status orders-db --namespace payments
  rotctl generate --length 24
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (defaults to `default`; `list` defaults to all)
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List SecretRotation resources
    List,
    /// Show status of a SecretRotation resource
    Status {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Request a rotation now, ahead of the schedule
    Rotate {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Suspend rotation for a SecretRotation resource
    Suspend {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Resume rotation for a SecretRotation resource
    Resume {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Generate a password locally (nothing is written anywhere)
    Generate {
        /// Password length (0 means the default of 16)
        #[arg(short, long, default_value_t = 0)]
        length: u32,

        /// Include punctuation symbols
        #[arg(short, long)]
        symbols: bool,
    },
}

async fn kube_client() -> Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")
}

#[tokio::main]
async fn main() -> Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rotctl=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => list::list_command(kube_client().await?, cli.namespace).await,
        Commands::Status { name } => {
            status::status_command(kube_client().await?, name, cli.namespace).await
        }
        Commands::Rotate { name } => {
            rotate::rotate_command(kube_client().await?, name, cli.namespace).await
        }
        Commands::Suspend { name } => {
            suspend::suspend_command(kube_client().await?, name, cli.namespace).await
        }
        Commands::Resume { name } => {
            suspend::resume_command(kube_client().await?, name, cli.namespace).await
        }
        Commands::Generate { length, symbols } => generate::generate_command(length, symbols),
    }
}
