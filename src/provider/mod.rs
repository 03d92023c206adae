//! # Secret Store Providers
//!
//! The rotation engine writes generated credentials through the
//! [`SecretStore`] trait. Implementations:
//! - `vault`: HashiCorp Vault over HTTP (production)
//! - `memory`: in-process store with failure injection (tests, dry runs)

use crate::rotation::GeneratedSecret;
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod vault;

pub use memory::{InMemorySecretStore, StoreBehavior};
pub use vault::VaultSecretStore;

/// Reasons a store write can fail
///
/// The engine treats every variant the same way (retry after a fixed delay);
/// the distinction only feeds logs and the status message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("transport error writing '{path}': {reason}")]
    Transport { path: String, reason: String },
    #[error("store rejected write to '{path}' with HTTP {status}: {body}")]
    Rejected {
        path: String,
        status: u16,
        body: String,
    },
    #[error("secret store authentication failed: {0}")]
    Authentication(String),
    #[error("secret store misconfigured: {0}")]
    Configuration(String),
    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

/// Write-only capability over an external secret store
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Short identifier used in metric labels and logs
    fn kind(&self) -> &'static str;

    /// Write `secret` to `path` in a single bounded attempt.
    ///
    /// Implementations must not retry internally and must not log the secret.
    async fn write(&self, path: &str, secret: GeneratedSecret) -> Result<(), StoreError>;
}
