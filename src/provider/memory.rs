//! # In-Memory Secret Store
//!
//! A [`SecretStore`] that keeps written values in process memory. Its
//! behavior can be switched between success and failure at runtime so the
//! engine's retry paths can be exercised without a real backend.

use crate::provider::{SecretStore, StoreError};
use crate::rotation::GeneratedSecret;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use zeroize::Zeroizing;

/// How the next writes should behave
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBehavior {
    Succeed,
    /// Every write fails with the given reason
    Fail(String),
    /// The next `n` writes fail, then writes succeed
    FailTimes(u32),
}

#[derive(Debug)]
struct Inner {
    behavior: StoreBehavior,
    values: HashMap<String, Zeroizing<String>>,
    attempts: usize,
    successes: usize,
}

#[derive(Debug)]
pub struct InMemorySecretStore {
    inner: Mutex<Inner>,
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new(StoreBehavior::Succeed)
    }
}

impl InMemorySecretStore {
    #[must_use]
    pub fn new(behavior: StoreBehavior) -> Self {
        Self {
            inner: Mutex::new(Inner {
                behavior,
                values: HashMap::new(),
                attempts: 0,
                successes: 0,
            }),
        }
    }

    /// Always fails with `reason`
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self::new(StoreBehavior::Fail(reason.to_string()))
    }

    pub fn set_behavior(&self, behavior: StoreBehavior) {
        self.lock().behavior = behavior;
    }

    /// Number of `write` calls, successful or not
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Number of successful writes
    #[must_use]
    pub fn successes(&self) -> usize {
        self.lock().successes
    }

    /// Copy of the latest value written to `path`
    #[must_use]
    pub fn value(&self, path: &str) -> Option<String> {
        self.lock().values.get(path).map(|v| v.to_string())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test thread panicked mid-write
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn write(&self, path: &str, secret: GeneratedSecret) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.attempts += 1;

        match &mut inner.behavior {
            StoreBehavior::Succeed => {}
            StoreBehavior::Fail(reason) => {
                return Err(StoreError::Unavailable(reason.clone()));
            }
            StoreBehavior::FailTimes(remaining) => {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StoreError::Unavailable(format!(
                        "injected failure ({remaining} remaining)"
                    )));
                }
            }
        }

        inner
            .values
            .insert(path.to_string(), Zeroizing::new(secret.expose().to_string()));
        inner.successes += 1;
        Ok(())
    }
}
