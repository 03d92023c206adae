//! # Logging
//!
//! Tracing subscriber setup. The filter comes from `RUST_LOG` when set,
//! otherwise from `LOG_LEVEL`, otherwise `secret_rotator=info`.

use crate::config::ControllerConfig;
use crate::constants::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

/// Filter directive for a `LOG_LEVEL` value such as `DEBUG` or `warn`.
///
/// Plain level names are scoped to this crate so dependencies stay quiet;
/// anything else is passed through as a full directive string.
#[must_use]
pub fn filter_directive(log_level: &str) -> String {
    let level = log_level.trim().to_lowercase();
    match level.as_str() {
        "" => DEFAULT_LOG_FILTER.to_string(),
        "error" | "warn" | "info" | "debug" | "trace" => format!("secret_rotator={level}"),
        _ => level,
    }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_tracing(config: &ControllerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(filter_directive(&config.log_level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.log_format.eq_ignore_ascii_case("text") {
        builder.try_init()
    } else {
        builder.json().with_current_span(true).try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
}
