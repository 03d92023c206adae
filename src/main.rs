//! # Secret Rotator
//!
//! Kubernetes operator that periodically regenerates passwords declared by
//! `SecretRotation` resources and writes them to HashiCorp Vault.
//!
//! ## Overview
//!
//! 1. **Watches** `SecretRotation` resources (all namespaces, or `WATCH_NAMESPACE`)
//! 2. **Decides** whether each secret is due for rotation
//! 3. **Generates** a new password with the OS CSPRNG
//! 4. **Writes** it to Vault at the resource's `storePath`
//! 5. **Records** the outcome in the resource status and requeues

use anyhow::Result;
use secret_rotator::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(
        init.rotations,
        init.reconciler,
        init.server_state,
        &init.controller_config,
    )
    .await
}
