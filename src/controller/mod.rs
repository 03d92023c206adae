//! # Controller
//!
//! Kubernetes-facing side of the operator.
//!
//! - `backoff`: Fibonacci backoff for retries
//! - `reconciler`: maps `SecretRotation` resources onto the rotation engine
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
