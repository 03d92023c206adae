//! # Runtime
//!
//! Controller runtime components.
//!
//! - `initialization`: process setup and dependency wiring
//! - `watch_loop`: kube-runtime controller loop with graceful shutdown
//! - `error_policy`: per-resource backoff for failed reconciliations

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
