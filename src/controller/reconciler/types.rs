//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::provider::SecretStore;
use crate::rotation::{CredentialGenerator, EngineError};
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("SecretRotation is missing metadata.{0}")]
    MissingMetadata(&'static str),
}

/// Backoff state for a specific resource
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}

/// Everything a rotation cycle needs apart from the Kubernetes client
pub struct RotationContext {
    pub store: Arc<dyn SecretStore>,
    pub generator: Arc<CredentialGenerator>,
    pub config: ControllerConfig,
    /// Backoff state per resource (identified by namespace/name)
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for RotationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationContext")
            .field("store", &self.store.kind())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RotationContext {
    #[must_use]
    pub fn new(
        store: Arc<dyn SecretStore>,
        generator: Arc<CredentialGenerator>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Next backoff delay for `key`, counting one more error
    pub fn next_backoff(&self, key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states.entry(key.to_string()).or_insert_with(|| {
                    BackoffState::new(
                        self.config.error_backoff_min_secs,
                        self.config.error_backoff_max_secs,
                    )
                });
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using maximum backoff", e);
                (Duration::from_secs(self.config.error_backoff_max_secs), 0)
            }
        }
    }

    /// Delay the next [`Self::next_backoff`] call for `key` will return
    #[must_use]
    pub fn peek_backoff(&self, key: &str) -> Duration {
        match self.backoff_states.lock() {
            Ok(states) => states.get(key).map_or_else(
                || {
                    FibonacciBackoff::new(
                        self.config.error_backoff_min_secs,
                        self.config.error_backoff_max_secs,
                    )
                    .peek()
                },
                |state| state.backoff.peek(),
            ),
            Err(_) => Duration::from_secs(self.config.error_backoff_max_secs),
        }
    }

    /// Forget the error history of `key`
    pub fn reset_backoff(&self, key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(key);
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_backoffs(&self) -> usize {
        self.backoff_states.lock().map_or(0, |states| states.len())
    }
}

/// Shared context handed to every reconciliation
pub struct Reconciler {
    pub client: Client,
    pub context: RotationContext,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(client: Client, store: Arc<dyn SecretStore>, config: ControllerConfig) -> Self {
        Self {
            client,
            context: RotationContext::new(store, Arc::new(CredentialGenerator::default()), config),
        }
    }
}
