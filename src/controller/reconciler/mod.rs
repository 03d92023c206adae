//! # Reconciler
//!
//! Reconciliation of `SecretRotation` resources.
//!
//! ## Reconciliation Flow
//!
//! 1. Skip suspended resources
//! 2. Skip events that are not a spec change, a due attempt or a new rotate
//!    request (see [`CycleTrigger`])
//! 3. Read the policy from the spec and the rotation state from the status
//! 4. Run one rotation cycle (see [`crate::rotation::RotationEngine`])
//! 5. Patch the status subresource with the new state
//! 6. Requeue according to the cycle's directive

pub mod reconcile;
pub mod status;
pub mod types;

pub use reconcile::{classify_trigger, reconcile, resource_key, run_cycle, CycleTrigger};
pub use status::{build_status, rotate_request, AttemptSchedule, KubeStatusPersister};
pub use types::{BackoffState, Reconciler, ReconcilerError, RotationContext};
