//! # Vault Configuration
//!
//! Address, authentication and request bounds for the Vault store.
//!
//! Authentication is chosen from the environment:
//! - `VAULT_TOKEN` set: static token
//! - otherwise `VAULT_AUTH_ROLE` set: Kubernetes auth login with the pod's
//!   service-account token
//! - neither: requests carry no token (Vault Agent proxy or dev server)

use crate::config::{env_non_empty, env_or_default, env_or_default_str, process_env, EnvLookup};
use crate::constants::{
    DEFAULT_ROTATED_BY, DEFAULT_SA_TOKEN_PATH, DEFAULT_VAULT_ADDR, DEFAULT_VAULT_AUTH_MOUNT,
    DEFAULT_VAULT_REQUEST_TIMEOUT_SECS,
};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use zeroize::Zeroizing;

/// How the operator authenticates to Vault
#[derive(Clone)]
pub enum VaultAuthConfig {
    /// No `X-Vault-Token` header
    None,
    Token(Zeroizing<String>),
    /// Kubernetes auth method: `POST /v1/auth/{mount}/login`
    Kubernetes {
        role: String,
        mount: String,
        token_path: PathBuf,
    },
}

impl fmt::Debug for VaultAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultAuthConfig::None => f.write_str("None"),
            VaultAuthConfig::Token(_) => f.debug_tuple("Token").field(&"***").finish(),
            VaultAuthConfig::Kubernetes {
                role,
                mount,
                token_path,
            } => f
                .debug_struct("Kubernetes")
                .field("role", role)
                .field("mount", mount)
                .field("token_path", token_path)
                .finish(),
        }
    }
}

impl VaultAuthConfig {
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            VaultAuthConfig::None => "none",
            VaultAuthConfig::Token(_) => "token",
            VaultAuthConfig::Kubernetes { .. } => "kubernetes",
        }
    }
}

/// Vault connection settings
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Base address, e.g. `http://vault.vault-system:8200`
    pub address: String,
    pub auth: VaultAuthConfig,
    /// Enterprise namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
    pub request_timeout: Duration,
    /// Written as `rotated_by` next to every password
    pub rotated_by: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_VAULT_ADDR.to_string(),
            auth: VaultAuthConfig::None,
            namespace: None,
            request_timeout: Duration::from_secs(DEFAULT_VAULT_REQUEST_TIMEOUT_SECS),
            rotated_by: DEFAULT_ROTATED_BY.to_string(),
        }
    }
}

impl VaultConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }

    #[must_use]
    pub fn from_lookup(env: &impl EnvLookup) -> Self {
        let auth = if let Some(token) = env_non_empty(env, "VAULT_TOKEN") {
            VaultAuthConfig::Token(Zeroizing::new(token))
        } else if let Some(role) = env_non_empty(env, "VAULT_AUTH_ROLE") {
            VaultAuthConfig::Kubernetes {
                role,
                mount: env_or_default_str(env, "VAULT_AUTH_MOUNT", DEFAULT_VAULT_AUTH_MOUNT),
                token_path: PathBuf::from(env_or_default_str(
                    env,
                    "VAULT_SA_TOKEN_PATH",
                    DEFAULT_SA_TOKEN_PATH,
                )),
            }
        } else {
            VaultAuthConfig::None
        };

        Self {
            address: env_non_empty(env, "VAULT_ADDR")
                .unwrap_or_else(|| DEFAULT_VAULT_ADDR.to_string())
                .trim_end_matches('/')
                .to_string(),
            auth,
            namespace: env_non_empty(env, "VAULT_NAMESPACE"),
            request_timeout: Duration::from_secs(
                env_or_default(
                    env,
                    "VAULT_REQUEST_TIMEOUT_SECS",
                    DEFAULT_VAULT_REQUEST_TIMEOUT_SECS,
                )
                .max(1),
            ),
            rotated_by: env_or_default_str(env, "VAULT_ROTATED_BY", DEFAULT_ROTATED_BY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_env::from_pairs;

    #[test]
    fn test_defaults() {
        let config = VaultConfig::from_lookup(&from_pairs(&[]));
        assert_eq!(config.address, "http://vault.vault-system:8200");
        assert!(matches!(config.auth, VaultAuthConfig::None));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.rotated_by, "secret-rotator-operator");
    }

    #[test]
    fn test_token_wins_over_role() {
        let config = VaultConfig::from_lookup(&from_pairs(&[
            ("VAULT_ADDR", "https://vault.example.com/"),
            ("VAULT_TOKEN", "s.abc"),
            ("VAULT_AUTH_ROLE", "rotator"),
        ]));
        assert_eq!(config.address, "https://vault.example.com");
        assert_eq!(config.auth.method(), "token");
    }

    #[test]
    fn test_kubernetes_auth() {
        let config = VaultConfig::from_lookup(&from_pairs(&[
            ("VAULT_AUTH_ROLE", "rotator"),
            ("VAULT_AUTH_MOUNT", "k8s-prod"),
        ]));
        match config.auth {
            VaultAuthConfig::Kubernetes {
                role,
                mount,
                token_path,
            } => {
                assert_eq!(role, "rotator");
                assert_eq!(mount, "k8s-prod");
                assert_eq!(token_path, PathBuf::from(DEFAULT_SA_TOKEN_PATH));
            }
            other => panic!("unexpected auth {other:?}"),
        }
    }

    #[test]
    fn test_debug_hides_token() {
        let config = VaultConfig::from_lookup(&from_pairs(&[("VAULT_TOKEN", "s.topsecret")]));
        assert!(!format!("{config:?}").contains("topsecret"));
    }
}
