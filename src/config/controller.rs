//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::config::{
    env_non_empty, env_or_default, env_or_default_str, process_env, EnvLookup,
};
use crate::constants::{
    DEFAULT_ERROR_BACKOFF_MAX_SECS, DEFAULT_ERROR_BACKOFF_MIN_SECS,
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_STORE_FAILURE_REQUEUE_SECS,
    DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::time::Duration;

/// Controller-level configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Requeue delay after a failed store write (seconds)
    pub store_failure_requeue_secs: u64,
    /// First value of the per-resource error backoff (seconds)
    pub error_backoff_min_secs: u64,
    /// Cap of the per-resource error backoff (seconds)
    pub error_backoff_max_secs: u64,
    /// Limits how many resources are reconciled simultaneously
    pub max_concurrent_reconciliations: usize,
    /// Delay before the watch stream is restarted after it ends (seconds)
    pub watch_restart_delay_secs: u64,
    /// Namespace to watch; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            store_failure_requeue_secs: DEFAULT_STORE_FAILURE_REQUEUE_SECS,
            error_backoff_min_secs: DEFAULT_ERROR_BACKOFF_MIN_SECS,
            error_backoff_max_secs: DEFAULT_ERROR_BACKOFF_MAX_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            watch_namespace: None,
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }

    #[must_use]
    pub fn from_lookup(env: &impl EnvLookup) -> Self {
        let defaults = Self::default();
        let error_backoff_min_secs =
            env_or_default(env, "ERROR_BACKOFF_MIN_SECS", defaults.error_backoff_min_secs).max(1);
        let error_backoff_max_secs =
            env_or_default(env, "ERROR_BACKOFF_MAX_SECS", defaults.error_backoff_max_secs)
                .max(error_backoff_min_secs);

        Self {
            store_failure_requeue_secs: env_or_default(
                env,
                "STORE_FAILURE_REQUEUE_SECS",
                defaults.store_failure_requeue_secs,
            ),
            error_backoff_min_secs,
            error_backoff_max_secs,
            max_concurrent_reconciliations: env_or_default(
                env,
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            )
            .max(1),
            watch_restart_delay_secs: env_or_default(
                env,
                "WATCH_RESTART_DELAY_SECS",
                defaults.watch_restart_delay_secs,
            ),
            watch_namespace: env_non_empty(env, "WATCH_NAMESPACE"),
            log_level: env_or_default_str(env, "LOG_LEVEL", &defaults.log_level),
            log_format: env_or_default_str(env, "LOG_FORMAT", &defaults.log_format),
        }
    }

    #[must_use]
    pub fn store_failure_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.store_failure_requeue_secs)
    }

    #[must_use]
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}
