//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use secret_rotator::prelude::*;
//! ```

// CRD types
pub use crate::crd::{Condition, SecretRotation, SecretRotationSpec, SecretRotationStatus};

// Store trait and implementations
pub use crate::provider::{InMemorySecretStore, SecretStore, StoreError, VaultSecretStore};

// Rotation engine
pub use crate::rotation::{
    CredentialGenerator, EngineError, GeneratedSecret, GenerationError, RequeueDirective,
    RotationEngine, RotationPolicy, RotationState, RotationStatus, StatePersister,
};

// Reconciler types
pub use crate::controller::reconciler::{reconcile, Reconciler, ReconcilerError};

// Config types
pub use crate::config::{ControllerConfig, ServerConfig, VaultConfig};
