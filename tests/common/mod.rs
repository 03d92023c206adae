//! Shared helpers for integration tests

#![allow(dead_code, reason = "each test binary uses a different subset")]

use chrono::{DateTime, TimeZone, Utc};
use secret_rotator::rotation::RotationPolicy;
use std::sync::Once;

static RUSTLS_INIT: Once = Once::new();

/// Install the ring crypto provider once per test binary
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // Another test may have won the race in the same process
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Fixed reference time for deterministic scheduling
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn policy(interval: &str) -> RotationPolicy {
    RotationPolicy {
        interval: interval.to_string(),
        password_length: 0,
        include_symbols: false,
        store_path: "secret/data/payments/orders-db".to_string(),
    }
}
