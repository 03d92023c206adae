//! # Initialization
//!
//! Process startup: rustls provider, tracing, metrics, HTTP server,
//! Kubernetes client, Vault store and reconciler context.

use crate::config::{ControllerConfig, ServerConfig, VaultAuthConfig, VaultConfig};
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::SecretRotation;
use crate::observability;
use crate::provider::VaultSecretStore;
use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Components needed by the watch loop
pub struct InitializationResult {
    pub client: Client,
    pub rotations: Api<SecretRotation>,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub controller_config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// # Errors
/// Fails if the rustls provider, metrics, HTTP server, Kubernetes client or
/// Vault client cannot be set up.
pub async fn initialize() -> Result<InitializationResult> {
    // Must happen before anything opens a TLS connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(anyhow::anyhow!("Failed to install rustls crypto provider"));
    }

    let controller_config = ControllerConfig::from_env();
    let server_config = ServerConfig::from_env();
    let vault_config = VaultConfig::from_env();

    observability::init_tracing(&controller_config);

    info!("Starting Secret Rotator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState::default());
    let server_port = server_config.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let rotations: Api<SecretRotation> = match &controller_config.watch_namespace {
        Some(namespace) => {
            info!("Watching SecretRotation resources in namespace '{}'", namespace);
            Api::namespaced(client.clone(), namespace)
        }
        None => {
            info!("Watching SecretRotation resources in all namespaces");
            Api::all(client.clone())
        }
    };

    if matches!(vault_config.auth, VaultAuthConfig::None) {
        warn!("Neither VAULT_TOKEN nor VAULT_AUTH_ROLE is set, Vault requests will be unauthenticated");
    }
    let store = VaultSecretStore::new(vault_config).context("Failed to create Vault client")?;

    let reconciler = Arc::new(Reconciler::new(
        client.clone(),
        Arc::new(store),
        controller_config.clone(),
    ));

    check_crd_installed(&rotations).await;

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        rotations,
        reconciler,
        server_state,
        controller_config,
    })
}

/// Wait for the HTTP server to bind
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > server_config.startup_timeout() {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                server_config.startup_timeout_secs
            ));
        }

        tokio::time::sleep(server_config.poll_interval()).await;
    }
}

/// Log a startup summary, or a hint when the CRD is missing
async fn check_crd_installed(rotations: &Api<SecretRotation>) {
    match rotations.list(&ListParams::default()).await {
        Ok(list) => {
            info!(
                "CRD is queryable, found {} existing SecretRotation resources",
                list.items.len()
            );
        }
        Err(e) => {
            error!("CRD is not queryable; {:?}. Is the CRD installed?", e);
            error!("Installation: crdgen | kubectl apply -f -");
            warn!("Continuing despite CRD queryability check failure - controller will retry");
        }
    }
}
