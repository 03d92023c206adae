//! # Constants
//!
//! Shared defaults for the operator. Most can be overridden through the
//! environment (see [`crate::config`]).

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// How long to wait for the HTTP server to bind at startup
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Readiness poll interval while waiting for the HTTP server
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Delay before retrying a cycle whose store write failed (seconds)
pub const DEFAULT_STORE_FAILURE_REQUEUE_SECS: u64 = 30;

/// First value of the per-resource Fibonacci error backoff (seconds)
pub const DEFAULT_ERROR_BACKOFF_MIN_SECS: u64 = 1;

/// Cap of the per-resource Fibonacci error backoff (seconds)
pub const DEFAULT_ERROR_BACKOFF_MAX_SECS: u64 = 30;

/// Default number of resources reconciled in parallel
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: usize = 10;

/// Delay before restarting the watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Vault address used when `VAULT_ADDR` is unset
pub const DEFAULT_VAULT_ADDR: &str = "http://vault.vault-system:8200";

/// Mount path of the Vault Kubernetes auth method
pub const DEFAULT_VAULT_AUTH_MOUNT: &str = "kubernetes";

/// Projected service-account token read for Vault Kubernetes auth
pub const DEFAULT_SA_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Bound on a single Vault request (seconds)
pub const DEFAULT_VAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Value of the `rotated_by` field written next to each password
pub const DEFAULT_ROTATED_BY: &str = "secret-rotator-operator";

/// Default tracing filter when neither `RUST_LOG` nor `LOG_LEVEL` is set
pub const DEFAULT_LOG_FILTER: &str = "secret_rotator=info";

/// Annotation `rotctl rotate` sets to request an out-of-schedule rotation.
/// Each new value triggers one rotation; the handled value is echoed in
/// `status.lastRotateRequest`.
pub const ROTATE_REQUEST_ANNOTATION: &str = "rotation.security.io/rotate-requested-at";
