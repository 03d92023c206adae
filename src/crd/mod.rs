//! # Custom Resource Definitions
//!
//! - `spec.rs` - `SecretRotation` resource and its spec
//! - `status.rs` - status subresource and conditions

mod spec;
mod status;

pub use spec::{SecretRotation, SecretRotationSpec};
pub use status::{ready_condition_for, Condition, SecretRotationStatus};
pub(crate) use status::{format_time, parse_time};
