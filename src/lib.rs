//! Secret Rotator Library
//!
//! Core functionality for the Secret Rotator operator. The rotation logic in
//! [`rotation`] is independent of Kubernetes; [`controller`] and [`runtime`]
//! wire it to `SecretRotation` resources.
//!
//! ## Quick Start
//!
//! ```rust
//! use secret_rotator::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod rotation;
pub mod runtime;
