//! # Error Policy
//!
//! Error handling and backoff for the controller watch loop.

use crate::controller::reconciler::{resource_key, Reconciler, ReconcilerError};
use crate::crd::SecretRotation;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info};

/// Requeue a failed reconciliation with per-resource Fibonacci backoff.
///
/// State is tracked per `namespace/name` so one failing resource never slows
/// down the others. The sequence restarts after the next successful cycle.
pub fn handle_reconciliation_error(
    obj: Arc<SecretRotation>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.metadata.name.as_deref().unwrap_or("unknown");
    let namespace = obj.metadata.namespace.as_deref().unwrap_or("unknown");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name,
        resource.namespace = namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);
    metrics::increment_reconciliation_errors();

    let key = resource_key(&obj).unwrap_or_else(|_| format!("{namespace}/{name}"));
    let (delay, error_count) = ctx.context.next_backoff(&key);

    info!(
        retry_secs = delay.as_secs(),
        error_count, "Retrying with Fibonacci backoff"
    );
    metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}

/// How the watch loop should treat a controller stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// RBAC revoked or token expired
    Unauthorized,
    /// Resource version too old; the watcher re-lists on its own
    Expired,
    /// Object or CRD missing
    NotFound,
    Other,
}

/// Classify a stringified controller error
#[must_use]
pub fn classify_watch_error(error: &str) -> WatchErrorKind {
    // 404s can surface inside a WatchFailed chain, so check them first
    if error.contains("ObjectNotFound") || error.contains("404") || error.contains("not found") {
        WatchErrorKind::NotFound
    } else if error.contains("401") || error.contains("Unauthorized") {
        WatchErrorKind::Unauthorized
    } else if error.contains("410") || error.contains("too old resource version") {
        WatchErrorKind::Expired
    } else {
        WatchErrorKind::Other
    }
}

/// Log a controller stream error at the level its kind deserves
pub fn log_watch_error(error: &str) {
    match classify_watch_error(error) {
        WatchErrorKind::Unauthorized => error!(
            "Watch authentication failed (401); check the ClusterRole and ServiceAccount bindings for secretrotations: {}",
            error
        ),
        WatchErrorKind::Expired => {
            tracing::warn!("Watch resource version expired (410), watcher will re-list");
        }
        WatchErrorKind::NotFound => tracing::warn!(
            "SecretRotation or its CRD not found (404); is the CRD installed? {}",
            error
        ),
        WatchErrorKind::Other => error!("Controller stream error: {}", error),
    }
}
