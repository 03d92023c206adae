//! # Status
//!
//! Persists rotation state to the `SecretRotation` status subresource with a
//! JSON merge patch.

use crate::constants::ROTATE_REQUEST_ANNOTATION;
use crate::crd::{format_time, ready_condition_for, Condition, SecretRotation, SecretRotationStatus};
use crate::rotation::{RotationState, RotationStatus, StatePersister};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::api::{Api, Patch, PatchParams};
use std::time::Duration;
use tracing::debug;

/// Delays used to stamp `nextRotationTime` on a persisted state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptSchedule {
    /// Parsed rotation interval, when valid
    pub interval: Option<Duration>,
    /// Delay before retrying after a store failure
    pub store_retry: Duration,
    /// Delay before retrying after a generation failure
    pub generation_retry: Duration,
}

impl AttemptSchedule {
    /// When the next cycle should run for `state`, persisted at `now`.
    ///
    /// `None` for a config error: only a spec change runs the next cycle.
    #[must_use]
    pub fn next_attempt(&self, state: &RotationState, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let after = |base: DateTime<Utc>, delay: Duration| {
            chrono::Duration::from_std(delay)
                .ok()
                .and_then(|delay| base.checked_add_signed(delay))
        };

        match state.status? {
            RotationStatus::Ready => after(state.last_rotated_time?, self.interval?),
            RotationStatus::StoreError => after(now, self.store_retry),
            RotationStatus::GenerationError => after(now, self.generation_retry),
            RotationStatus::ConfigError => None,
        }
    }
}

/// Build the status written for `state`.
#[must_use]
pub fn build_status(
    state: &RotationState,
    generation: Option<i64>,
    schedule: &AttemptSchedule,
    rotate_request: Option<&str>,
    previous_ready: Option<&Condition>,
    now: DateTime<Utc>,
) -> SecretRotationStatus {
    SecretRotationStatus {
        last_rotated_time: state.last_rotated_time.map(format_time),
        status: state.status.map(|s| s.as_str().to_string()),
        message: state.message.clone(),
        observed_generation: generation,
        next_rotation_time: schedule.next_attempt(state, now).map(format_time),
        last_rotate_request: rotate_request.map(str::to_string),
        conditions: vec![ready_condition_for(state, previous_ready, now)],
    }
}

/// [`StatePersister`] that patches the status of one `SecretRotation`
pub struct KubeStatusPersister {
    api: Api<SecretRotation>,
    name: String,
    generation: Option<i64>,
    schedule: AttemptSchedule,
    rotate_request: Option<String>,
    previous_ready: Option<Condition>,
}

impl std::fmt::Debug for KubeStatusPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStatusPersister")
            .field("name", &self.name)
            .field("generation", &self.generation)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl KubeStatusPersister {
    #[must_use]
    pub fn new(api: Api<SecretRotation>, resource: &SecretRotation, schedule: AttemptSchedule) -> Self {
        Self {
            api,
            name: resource.metadata.name.clone().unwrap_or_default(),
            generation: resource.metadata.generation,
            schedule,
            rotate_request: rotate_request(resource).map(str::to_string),
            previous_ready: resource
                .status
                .as_ref()
                .and_then(SecretRotationStatus::ready_condition)
                .cloned(),
        }
    }
}

/// Current value of the rotate-request annotation, if set
#[must_use]
pub fn rotate_request(resource: &SecretRotation) -> Option<&str> {
    resource
        .metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(ROTATE_REQUEST_ANNOTATION))
        .map(String::as_str)
}

#[async_trait]
impl StatePersister for KubeStatusPersister {
    async fn persist(&self, state: &RotationState) -> Result<()> {
        let status = build_status(
            state,
            self.generation,
            &self.schedule,
            self.rotate_request.as_deref(),
            self.previous_ready.as_ref(),
            Utc::now(),
        );
        let patch = serde_json::json!({ "status": status });

        self.api
            .patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("Failed to patch status of SecretRotation '{}'", self.name))?;

        debug!(
            status = status.status.as_deref().unwrap_or(""),
            next_rotation_time = status.next_rotation_time.as_deref().unwrap_or(""),
            "Status updated"
        );
        Ok(())
    }
}
