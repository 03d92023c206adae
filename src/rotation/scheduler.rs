//! # Scheduler
//!
//! Decides whether a rotation is due.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of [`decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    RotateNow,
    WaitFor(Duration),
}

/// Decide whether a secret rotated at `last_rotated` is due at `now`.
///
/// Never rotated means due. The boundary is inclusive: exactly one
/// `interval` after the last rotation is due. A `last_rotated` in the future
/// counts as zero elapsed time.
#[must_use]
pub fn decide(
    interval: Duration,
    last_rotated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Decision {
    let Some(last_rotated) = last_rotated else {
        return Decision::RotateNow;
    };

    let elapsed = now
        .signed_duration_since(last_rotated)
        .to_std()
        .unwrap_or(Duration::ZERO);

    if elapsed >= interval {
        Decision::RotateNow
    } else {
        Decision::WaitFor(interval - elapsed)
    }
}
