//! # HashiCorp Vault Store
//!
//! Writes rotated passwords to Vault over its HTTP API.
//!
//! Each write is a single `POST {address}/v1/{path}` with the KV v2 body
//! `{"data": {"password": ..., "rotated_by": ...}}`, so `path` is expected to
//! include the `data/` segment for KV v2 mounts (e.g. `secret/data/db`).
//!
//! With Kubernetes auth the client token from the login is cached until its
//! lease is nearly over. A 401 or 403 on a write drops the cached token so the
//! next cycle logs in again.

use crate::config::{VaultAuthConfig, VaultConfig};
use crate::provider::{SecretStore, StoreError};
use crate::rotation::GeneratedSecret;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};
use zeroize::Zeroizing;

/// Longest response body quoted in an error
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Serialize)]
struct WriteRequest<'a> {
    data: SecretData<'a>,
}

#[derive(Serialize)]
struct SecretData<'a> {
    password: &'a str,
    rotated_by: &'a str,
}

#[derive(Serialize)]
struct KubernetesLoginRequest<'a> {
    role: &'a str,
    jwt: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
    /// Seconds; 0 means the token does not expire
    #[serde(default)]
    lease_duration: u64,
}

struct CachedToken {
    token: Zeroizing<String>,
    refresh_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.refresh_at.is_none_or(|at| Instant::now() < at)
    }
}

/// [`SecretStore`] backed by HashiCorp Vault
pub struct VaultSecretStore {
    http: reqwest::Client,
    config: VaultConfig,
    cached_token: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for VaultSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSecretStore")
            .field("address", &self.config.address)
            .field("namespace", &self.config.namespace)
            .field("auth", &self.config.auth.method())
            .finish_non_exhaustive()
    }
}

impl VaultSecretStore {
    /// Build a store from `config`. No request is made until the first write.
    ///
    /// # Errors
    /// Returns [`StoreError::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StoreError::Configuration(format!("failed to build HTTP client: {e}")))?;

        info!(
            vault.address = %config.address,
            vault.auth = config.auth.method(),
            vault.namespace = config.namespace.as_deref().unwrap_or(""),
            "Vault secret store configured"
        );

        Ok(Self {
            http,
            config,
            cached_token: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.config.address
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.config.address,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.config.namespace {
            Some(namespace) => builder.header("X-Vault-Namespace", namespace),
            None => builder,
        }
    }

    /// Token for the next request, logging in first when needed
    async fn client_token(&self) -> Result<Option<Zeroizing<String>>, StoreError> {
        match &self.config.auth {
            VaultAuthConfig::None => Ok(None),
            VaultAuthConfig::Token(token) => Ok(Some(token.clone())),
            VaultAuthConfig::Kubernetes {
                role,
                mount,
                token_path,
            } => {
                let mut cached = self.cached_token.lock().await;
                if let Some(entry) = cached.as_ref().filter(|entry| entry.is_fresh()) {
                    return Ok(Some(entry.token.clone()));
                }

                let entry = self.kubernetes_login(role, mount, token_path).await?;
                let token = entry.token.clone();
                *cached = Some(entry);
                Ok(Some(token))
            }
        }
    }

    async fn kubernetes_login(
        &self,
        role: &str,
        mount: &str,
        token_path: &Path,
    ) -> Result<CachedToken, StoreError> {
        let jwt = Zeroizing::new(
            tokio::fs::read_to_string(token_path)
                .await
                .map_err(|e| {
                    StoreError::Configuration(format!(
                        "failed to read service account token {}: {e}",
                        token_path.display()
                    ))
                })?
                .trim()
                .to_string(),
        );

        let url = self.url(&format!("auth/{}/login", mount.trim_matches('/')));
        debug!(vault.auth.mount = mount, vault.auth.role = role, "Logging in to Vault");

        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&KubernetesLoginRequest { role, jwt: &jwt })
            .send()
            .await
            .map_err(|e| StoreError::Authentication(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(StoreError::Authentication(format!(
                "login with role '{role}' rejected with HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Authentication(format!("malformed login response: {e}")))?;

        // Refresh once 90% of the lease has elapsed
        let refresh_at = (login.auth.lease_duration > 0).then(|| {
            Instant::now() + Duration::from_secs(login.auth.lease_duration.saturating_mul(9) / 10)
        });

        info!(
            vault.auth.role = role,
            lease_secs = login.auth.lease_duration,
            "Authenticated to Vault with Kubernetes auth"
        );

        Ok(CachedToken {
            token: Zeroizing::new(login.auth.client_token),
            refresh_at,
        })
    }

    async fn invalidate_token(&self) {
        if matches!(self.config.auth, VaultAuthConfig::Kubernetes { .. }) {
            *self.cached_token.lock().await = None;
        }
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    fn kind(&self) -> &'static str {
        "vault"
    }

    async fn write(&self, path: &str, secret: GeneratedSecret) -> Result<(), StoreError> {
        let span = info_span!("vault.secret.write", store.path = path);

        async move {
            if path.trim_matches('/').is_empty() {
                return Err(StoreError::Configuration("empty store path".to_string()));
            }

            let token = self.client_token().await?;
            let url = self.url(path);

            let mut request = self
                .request(reqwest::Method::POST, &url)
                .json(&WriteRequest {
                    data: SecretData {
                        password: secret.expose(),
                        rotated_by: &self.config.rotated_by,
                    },
                });
            if let Some(token) = &token {
                request = request.header("X-Vault-Token", token.as_str());
            }
            drop(secret);

            let response = request.send().await.map_err(|e| StoreError::Transport {
                path: path.to_string(),
                reason: e.without_url().to_string(),
            })?;

            let status = response.status();
            if status.is_success() {
                debug!(status = status.as_u16(), "Vault accepted write");
                return Ok(());
            }

            let body = error_body(response).await;
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                warn!(
                    status = status.as_u16(),
                    "Vault rejected credentials, dropping cached token"
                );
                self.invalidate_token().await;
                return Err(StoreError::Authentication(format!(
                    "HTTP {} writing '{path}': {body}",
                    status.as_u16()
                )));
            }

            Err(StoreError::Rejected {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            })
        }
        .instrument(span)
        .await
    }
}

/// Response body for error messages, truncated and single-line
async fn error_body(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    let mut flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() > MAX_ERROR_BODY_LEN {
        let mut cut = MAX_ERROR_BODY_LEN;
        while !flat.is_char_boundary(cut) {
            cut -= 1;
        }
        flat.truncate(cut);
        flat.push_str("...");
    }
    flat
}
