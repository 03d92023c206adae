//! # State Persistence
//!
//! The engine hands every state change to a [`StatePersister`] before it
//! returns. The Kubernetes status patcher lives in the reconciler; the
//! in-memory persister here backs tests and local runs.

use crate::rotation::RotationState;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// Durable sink for [`RotationState`]
#[async_trait]
pub trait StatePersister: Send + Sync {
    /// Persist `state` as the new current state.
    async fn persist(&self, state: &RotationState) -> Result<()>;
}

/// Records every persisted state in memory
#[derive(Debug, Default)]
pub struct InMemoryStatePersister {
    history: Mutex<Vec<RotationState>>,
    fail_with: Mutex<Option<String>>,
}

impl InMemoryStatePersister {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `persist` calls fail (`Some`) or succeed (`None`)
    pub fn set_failure(&self, reason: Option<&str>) {
        *self
            .fail_with
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = reason.map(str::to_string);
    }

    /// Every state persisted so far, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<RotationState> {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<RotationState> {
        self.history().pop()
    }
}

#[async_trait]
impl StatePersister for InMemoryStatePersister {
    async fn persist(&self, state: &RotationState) -> Result<()> {
        let failure = self
            .fail_with
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        if let Some(reason) = failure {
            return Err(anyhow::anyhow!("status update rejected: {reason}"));
        }

        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(state.clone());
        Ok(())
    }
}
