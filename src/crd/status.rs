//! # SecretRotation Status
//!
//! Status persisted on the `status` subresource. Timestamps are RFC3339
//! strings, matching what `kubectl` prints.

use crate::rotation::{RotationState, RotationStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Status of the SecretRotation resource
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRotationStatus {
    /// Time of the last successful store write (RFC3339)
    #[serde(default)]
    pub last_rotated_time: Option<String>,
    /// Outcome of the last cycle: Ready, GenerationError, StoreError, ConfigError
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable description of the last outcome
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// When the next rotation attempt is due (RFC3339): the interval after a
    /// success, the retry delay after a store or generation failure
    #[serde(default)]
    pub next_rotation_time: Option<String>,
    /// Value of the rotate-request annotation last acted on
    #[serde(default)]
    pub last_rotate_request: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// True, False, Unknown
    pub status: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// RFC3339 in UTC, keeping sub-second digits only when present
pub(crate) fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| warn!(time = raw, "Ignoring unparseable status timestamp: {}", e))
        .ok()
}

impl SecretRotationStatus {
    /// Rotation state as seen by the engine.
    ///
    /// An unparseable `lastRotatedTime` is treated as never rotated, so the
    /// next cycle rotates and rewrites it.
    #[must_use]
    pub fn rotation_state(&self) -> RotationState {
        let last_rotated_time = self.last_rotated_time.as_deref().and_then(parse_time);

        RotationState {
            last_rotated_time,
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            message: self.message.clone(),
        }
    }

    /// The `Ready` condition, if present
    #[must_use]
    pub fn ready_condition(&self) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == "Ready")
    }
}

/// Build the `Ready` condition for `state`, keeping the previous transition
/// time when the condition status did not change.
#[must_use]
pub fn ready_condition_for(
    state: &RotationState,
    previous: Option<&Condition>,
    now: DateTime<Utc>,
) -> Condition {
    let (status, reason) = match state.status {
        Some(RotationStatus::Ready) => ("True", "Rotated"),
        Some(other) => ("False", other.as_str()),
        None => ("Unknown", "Pending"),
    };

    let last_transition_time = match previous {
        Some(prev) if prev.status == status => prev.last_transition_time.clone(),
        _ => Some(format_time(now)),
    };

    Condition {
        r#type: "Ready".to_string(),
        status: status.to_string(),
        last_transition_time,
        reason: Some(reason.to_string()),
        message: state.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rotation_state_parses_time_and_status() {
        let status = SecretRotationStatus {
            last_rotated_time: Some("2024-06-01T08:00:00Z".to_string()),
            status: Some("StoreError".to_string()),
            ..SecretRotationStatus::default()
        };
        let state = status.rotation_state();
        assert_eq!(
            state.last_rotated_time,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(state.status, Some(RotationStatus::StoreError));
    }

    #[test]
    fn test_garbage_time_reads_as_never_rotated() {
        let status = SecretRotationStatus {
            last_rotated_time: Some("yesterday".to_string()),
            status: Some("ErrorVault".to_string()),
            ..SecretRotationStatus::default()
        };
        let state = status.rotation_state();
        assert_eq!(state.last_rotated_time, None);
        assert_eq!(state.status, None);
    }

    #[test]
    fn test_sub_second_time_survives_round_trip() {
        let rotated = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        let formatted = format_time(rotated);
        assert_eq!(formatted, "2024-06-01T08:00:00.750Z");
        assert_eq!(parse_time(&formatted), Some(rotated));
        assert_eq!(
            format_time(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()),
            "2024-06-01T08:00:00Z"
        );
    }

    #[test]
    fn test_ready_condition_keeps_transition_time() {
        let earlier = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap();
        let ready = RotationState {
            last_rotated_time: Some(earlier),
            status: Some(RotationStatus::Ready),
            message: None,
        };

        let first = ready_condition_for(&ready, None, earlier);
        assert_eq!(first.status, "True");
        assert_eq!(first.last_transition_time.as_deref(), Some("2024-06-01T08:00:00Z"));

        let again = ready_condition_for(&ready, Some(&first), later);
        assert_eq!(again.last_transition_time, first.last_transition_time);

        let failed = ready.with_status(RotationStatus::StoreError, "down");
        let flipped = ready_condition_for(&failed, Some(&again), later);
        assert_eq!(flipped.status, "False");
        assert_eq!(flipped.reason.as_deref(), Some("StoreError"));
        assert_eq!(flipped.last_transition_time.as_deref(), Some("2024-06-02T08:00:00Z"));
    }
}
