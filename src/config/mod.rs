//! # Configuration
//!
//! Process-level settings loaded from environment variables. The deployment
//! populates them from a ConfigMap via `envFrom`; anything unset falls back
//! to the defaults in [`crate::constants`].
//!
//! - `controller`: reconciliation, backoff, concurrency and logging
//! - `server`: metrics/probe HTTP server
//! - `vault`: Vault address, authentication and request bounds

pub mod controller;
pub mod server;
pub mod vault;

pub use controller::ControllerConfig;
pub use server::ServerConfig;
pub use vault::{VaultAuthConfig, VaultConfig};

/// Environment lookup used by the `from_lookup` constructors.
///
/// `from_env` passes `std::env::var`; tests pass a map so they never touch
/// the process environment.
pub trait EnvLookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

pub(crate) fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Read and parse a variable, falling back to `default` when unset or invalid
pub(crate) fn env_or_default<T: std::str::FromStr>(
    env: &impl EnvLookup,
    key: &str,
    default: T,
) -> T {
    env.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_or_default_str(env: &impl EnvLookup, key: &str, default: &str) -> String {
    env.get(key).unwrap_or_else(|| default.to_string())
}

/// Read a variable, treating empty or whitespace-only values as unset
pub(crate) fn env_non_empty(env: &impl EnvLookup, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_env {
    use std::collections::HashMap;

    /// Build a lookup closure over fixed key/value pairs
    pub fn from_pairs(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_number_falls_back() {
        let env = test_env::from_pairs(&[("PORT", "not-a-port")]);
        assert_eq!(env_or_default(&env, "PORT", 5000u16), 5000);
        assert_eq!(env_or_default(&env, "MISSING", 7u64), 7);
    }

    #[test]
    fn test_blank_is_unset() {
        let env = test_env::from_pairs(&[("TOKEN", "   ")]);
        assert_eq!(env_non_empty(&env, "TOKEN"), None);
    }
}
