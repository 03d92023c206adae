//! # Reconcile
//!
//! Adapter between kube-runtime and the rotation engine. Maps the resource to
//! a policy and state, runs one cycle, and turns the requeue directive into an
//! [`Action`].
//!
//! Status patches come back as watch events. A cycle only runs when the spec
//! changed, the persisted `nextRotationTime` has passed, or a new rotate
//! request was annotated. Any other event requeues for the time still left.

use crate::controller::reconciler::status::{rotate_request, AttemptSchedule, KubeStatusPersister};
use crate::controller::reconciler::types::{ReconcilerError, Reconciler, RotationContext};
use crate::crd::{parse_time, SecretRotation, SecretRotationStatus};
use crate::observability::metrics;
use crate::rotation::{
    parse_interval, RequeueDirective, RotationEngine, RotationStatus, StatePersister,
};
use chrono::{DateTime, Utc};
use kube::api::Api;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, Instrument};

/// `namespace/name` key used for per-resource state
///
/// # Errors
/// Returns [`ReconcilerError::MissingMetadata`] if either part is absent.
pub fn resource_key(resource: &SecretRotation) -> Result<String, ReconcilerError> {
    let name = resource
        .metadata
        .name
        .as_deref()
        .ok_or(ReconcilerError::MissingMetadata("name"))?;
    let namespace = resource
        .metadata
        .namespace
        .as_deref()
        .ok_or(ReconcilerError::MissingMetadata("namespace"))?;
    Ok(format!("{namespace}/{name}"))
}

/// Why (or whether) a watch event should run a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    /// No status yet, or the spec generation moved past the observed one
    SpecChanged,
    /// The rotate-request annotation holds a value not yet handled
    Manual,
    /// The persisted `nextRotationTime` has passed
    Due,
    /// Nothing changed; the next attempt is this far away
    NotDue(Duration),
    /// Nothing changed and nothing is scheduled (config error)
    Idle,
}

/// Classify the event that delivered `resource` at `now`.
#[must_use]
pub fn classify_trigger(resource: &SecretRotation, now: DateTime<Utc>) -> CycleTrigger {
    let status = resource.status.as_ref();

    if let Some(request) = rotate_request(resource) {
        if status.and_then(|s| s.last_rotate_request.as_deref()) != Some(request) {
            return CycleTrigger::Manual;
        }
    }

    let Some(status) = status else {
        return CycleTrigger::SpecChanged;
    };
    if status.observed_generation.is_none()
        || status.observed_generation != resource.metadata.generation
    {
        return CycleTrigger::SpecChanged;
    }

    match status.next_rotation_time.as_deref().and_then(parse_time) {
        Some(due) => match (due - now).to_std() {
            Ok(remaining) if !remaining.is_zero() => CycleTrigger::NotDue(remaining),
            _ => CycleTrigger::Due,
        },
        None if status.status.as_deref() == Some(RotationStatus::ConfigError.as_str()) => {
            CycleTrigger::Idle
        }
        None => CycleTrigger::Due,
    }
}

/// Reconcile one `SecretRotation`
///
/// # Errors
/// Returns an error when the resource lacks a name or namespace, or when the
/// status could not be persisted. Both are retried by the error policy.
pub async fn reconcile(
    resource: Arc<SecretRotation>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let key = resource_key(&resource)?;
    let name = resource
        .metadata
        .name
        .clone()
        .ok_or(ReconcilerError::MissingMetadata("name"))?;
    let namespace = resource
        .metadata
        .namespace
        .clone()
        .ok_or(ReconcilerError::MissingMetadata("namespace"))?;

    let span = info_span!(
        "rotation.reconcile",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.generation = resource.metadata.generation.unwrap_or(0),
        store.path = resource.spec.store_path.as_str(),
    );

    async move {
        metrics::increment_reconciliations();
        let start = Instant::now();

        // generation_retry matches what run_cycle draws from the backoff
        let schedule = AttemptSchedule {
            interval: parse_interval(&resource.spec.rotation_interval).ok(),
            store_retry: ctx.context.config.store_failure_requeue_duration(),
            generation_retry: ctx.context.peek_backoff(&key),
        };
        let persister = KubeStatusPersister::new(
            Api::namespaced(ctx.client.clone(), &namespace),
            &resource,
            schedule,
        );
        let result = run_cycle(&ctx.context, &resource, &persister, Utc::now()).await;

        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        result
    }
    .instrument(span)
    .await
}

/// Run one cycle for `resource` and decide when kube-runtime should call again.
///
/// - `suspend: true` skips the cycle and waits for a spec change
/// - an event that is not a [`CycleTrigger`] to run requeues for the time left
/// - a manual trigger rotates even within the interval
/// - `NoRequeue` waits for a spec change
/// - an immediate requeue is spaced out with the per-resource backoff
/// - any other delay is used as is
///
/// # Errors
/// Returns an error if the updated state could not be persisted.
pub async fn run_cycle(
    ctx: &RotationContext,
    resource: &SecretRotation,
    persister: &dyn StatePersister,
    now: DateTime<Utc>,
) -> Result<Action, ReconcilerError> {
    let key = resource_key(resource)?;

    if resource.spec.suspend {
        info!("Rotation suspended, waiting for spec change");
        metrics::increment_requeues_total("suspended");
        return Ok(Action::await_change());
    }

    let trigger = classify_trigger(resource, now);
    let forced = match trigger {
        CycleTrigger::NotDue(remaining) => {
            debug!(remaining_secs = remaining.as_secs(), "Next attempt not due");
            metrics::increment_requeues_total("not-due");
            return Ok(Action::requeue(remaining));
        }
        CycleTrigger::Idle => {
            debug!("Nothing scheduled, waiting for spec change");
            metrics::increment_requeues_total("await-change");
            return Ok(Action::await_change());
        }
        CycleTrigger::Manual => {
            info!(
                request = rotate_request(resource).unwrap_or(""),
                "Manual rotation requested"
            );
            true
        }
        CycleTrigger::SpecChanged | CycleTrigger::Due => false,
    };

    let policy = resource.spec.policy();
    let state = resource
        .status
        .as_ref()
        .map(SecretRotationStatus::rotation_state)
        .unwrap_or_default();

    let engine = RotationEngine::new(
        &ctx.generator,
        ctx.store.as_ref(),
        persister,
        ctx.config.store_failure_requeue_duration(),
    );
    let outcome = if forced {
        engine.force(&policy, &state, now).await?
    } else {
        engine.reconcile(&policy, &state, now).await?
    };

    let action = match outcome.directive {
        RequeueDirective::NoRequeue => {
            ctx.reset_backoff(&key);
            metrics::increment_requeues_total("await-change");
            Action::await_change()
        }
        directive if directive.is_immediate() => {
            let (delay, attempts) = ctx.next_backoff(&key);
            info!(
                retry_secs = delay.as_secs(),
                attempts, "Retrying with Fibonacci backoff"
            );
            metrics::increment_requeues_total("retry-backoff");
            Action::requeue(delay)
        }
        RequeueDirective::RequeueAfter(delay) => {
            ctx.reset_backoff(&key);
            let reason = match outcome.state.status {
                Some(status) if status.is_error() => "store-retry",
                _ => "scheduled",
            };
            metrics::increment_requeues_total(reason);
            debug!(requeue_secs = delay.as_secs(), reason, "Requeue scheduled");
            Action::requeue(delay)
        }
    };

    Ok(action)
}
