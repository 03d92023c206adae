//! # Watch Loop
//!
//! Runs the kube-runtime controller over `SecretRotation` resources until a
//! shutdown signal arrives, restarting the stream if it ends early.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::SecretRotation;
use crate::runtime::error_policy::{handle_reconciliation_error, log_watch_error};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, watcher, Controller};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler, only SIGINT will stop the controller: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Run the controller watch loop
///
/// Reconciliations for different resources run concurrently up to
/// `max_concurrent_reconciliations`; kube-runtime never reconciles the same
/// resource twice at once.
///
/// # Errors
/// Currently never fails; the signature leaves room for startup checks.
pub async fn run_watch_loop(
    rotations: Api<SecretRotation>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    let shutdown = Arc::new(Notify::new());
    {
        let shutdown = Arc::clone(&shutdown);
        let server_state = Arc::clone(&server_state);
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Received shutdown signal, initiating graceful shutdown...");
            // Flip readiness first so the loop below does not restart
            server_state.set_ready(false);
            shutdown.notify_one();
        });
    }

    let concurrency = u16::try_from(config.max_concurrent_reconciliations).unwrap_or(u16::MAX);

    loop {
        if !server_state.ready() {
            break;
        }

        info!(concurrency, "Starting controller watch loop...");

        let trigger = Arc::clone(&shutdown);
        Controller::new(rotations.clone(), watcher::Config::default().any_semantic())
            .with_config(controller::Config::default().concurrency(concurrency))
            .graceful_shutdown_on(async move { trigger.notified().await })
            .run(reconcile, handle_reconciliation_error, Arc::clone(&reconciler))
            .for_each(|result| {
                match result {
                    Ok((object, action)) => {
                        debug!(resource.name = %object.name, action = ?action, "watch.event.reconciled");
                    }
                    Err(e) => log_watch_error(&format!("{e:?}")),
                }
                futures::future::ready(())
            })
            .await;

        if !server_state.ready() {
            break;
        }

        let delay = config.watch_restart_delay_duration();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}
