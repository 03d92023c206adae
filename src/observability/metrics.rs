//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `secret_rotator_rotations_total` - Secrets rotated and written to the store
//! - `secret_rotator_rotation_failures_total{status}` - Failed cycles by status
//! - `secret_rotator_reconciliations_total` - Reconciliations started
//! - `secret_rotator_reconciliation_errors_total` - Reconciliations that returned an error
//! - `secret_rotator_reconciliation_duration_seconds` - Reconciliation latency
//! - `secret_rotator_requeues_total{reason}` - Requeues by reason
//! - `secret_rotator_store_write_duration_seconds{store}` - Store write latency

use crate::rotation::RotationStatus;
use anyhow::Result;
use prometheus::{Encoder, Histogram, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static ROTATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_rotator_rotations_total",
        "Total number of secrets rotated and written to the store",
    )
    .expect("Failed to create ROTATIONS_TOTAL metric - this should never happen")
});

static ROTATION_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_rotator_rotation_failures_total",
            "Total number of failed rotation cycles by resulting status",
        ),
        &["status"],
    )
    .expect("Failed to create ROTATION_FAILURES_TOTAL metric - this should never happen")
});

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_rotator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_rotator_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "secret_rotator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_rotator_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static STORE_WRITE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "secret_rotator_store_write_duration_seconds",
            "Duration of secret store writes in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["store"],
    )
    .expect("Failed to create STORE_WRITE_DURATION metric - this should never happen")
});

/// Register all metrics with the registry. Safe to call more than once.
///
/// # Errors
/// Returns an error if a metric fails to register for a reason other than
/// already being registered.
pub fn register_metrics() -> Result<()> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ROTATIONS_TOTAL.clone()),
        Box::new(ROTATION_FAILURES_TOTAL.clone()),
        Box::new(RECONCILIATIONS_TOTAL.clone()),
        Box::new(RECONCILIATION_ERRORS_TOTAL.clone()),
        Box::new(RECONCILIATION_DURATION.clone()),
        Box::new(REQUEUES_TOTAL.clone()),
        Box::new(STORE_WRITE_DURATION.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Encode the registry in the Prometheus text format
///
/// # Errors
/// Returns an error if encoding fails.
pub fn encode_text() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

pub fn increment_rotations() {
    ROTATIONS_TOTAL.inc();
}

pub fn increment_rotation_failures(status: RotationStatus) {
    ROTATION_FAILURES_TOTAL
        .with_label_values(&[status.as_str()])
        .inc();
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_store_write_duration(store: &str, duration: f64) {
    STORE_WRITE_DURATION
        .with_label_values(&[store])
        .observe(duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_twice() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_increment_rotations() {
        let before = ROTATIONS_TOTAL.get();
        increment_rotations();
        assert!(ROTATIONS_TOTAL.get() > before);
    }

    #[test]
    fn test_rotation_failures_are_labelled() {
        let counter = ROTATION_FAILURES_TOTAL.with_label_values(&["ConfigError"]);
        let before = counter.get();
        increment_rotation_failures(RotationStatus::ConfigError);
        assert!(counter.get() > before);
    }

    #[test]
    fn test_requeues_are_labelled() {
        let counter = REQUEUES_TOTAL.with_label_values(&["scheduled"]);
        let before = counter.get();
        increment_requeues_total("scheduled");
        assert!(counter.get() > before);
    }

    #[test]
    fn test_encode_contains_registered_metrics() {
        register_metrics().unwrap();
        increment_reconciliations();
        observe_store_write_duration("memory", 0.01);
        let text = String::from_utf8(encode_text().unwrap()).unwrap();
        assert!(text.contains("secret_rotator_reconciliations_total"));
        assert!(text.contains("secret_rotator_store_write_duration_seconds"));
    }
}
