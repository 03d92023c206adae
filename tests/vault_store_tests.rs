//! # Vault Store Tests
//!
//! Runs `VaultSecretStore` against a small fake Vault served by axum on a
//! loopback port. The fake records every request and answers writes with a
//! configurable status code.

mod common;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use common::init_rustls;
use secret_rotator::config::{VaultAuthConfig, VaultConfig};
use secret_rotator::provider::{SecretStore, StoreError, VaultSecretStore};
use secret_rotator::rotation::GeneratedSecret;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zeroize::Zeroizing;

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    token: Option<String>,
    namespace: Option<String>,
    body: Value,
}

#[derive(Debug)]
struct FakeVault {
    requests: Mutex<Vec<Recorded>>,
    write_status: Mutex<StatusCode>,
    logins: Mutex<usize>,
}

impl FakeVault {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            write_status: Mutex::new(StatusCode::NO_CONTENT),
            logins: Mutex::new(0),
        })
    }

    fn set_write_status(&self, status: StatusCode) {
        *self.write_status.lock().unwrap() = status;
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn logins(&self) -> usize {
        *self.logins.lock().unwrap()
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn handle(
    State(fake): State<Arc<FakeVault>>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    fake.requests.lock().unwrap().push(Recorded {
        path: path.clone(),
        token: header(&headers, "x-vault-token"),
        namespace: header(&headers, "x-vault-namespace"),
        body: body.clone(),
    });

    if path == "auth/kubernetes/login" {
        if body["jwt"] != "sa-jwt" || body["role"] != "rotator" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"errors": ["invalid role or jwt"]})),
            )
                .into_response();
        }
        let n = {
            let mut logins = fake.logins.lock().unwrap();
            *logins += 1;
            *logins
        };
        return Json(json!({
            "auth": {"client_token": format!("k8s-token-{n}"), "lease_duration": 3600}
        }))
        .into_response();
    }

    let status = *fake.write_status.lock().unwrap();
    if status.is_success() {
        status.into_response()
    } else {
        (status, Json(json!({"errors": ["write failed"]}))).into_response()
    }
}

async fn start_fake_vault(fake: Arc<FakeVault>) -> String {
    let app = Router::new()
        .route("/v1/{*path}", post(handle))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(address: String, auth: VaultAuthConfig) -> VaultConfig {
    VaultConfig {
        address,
        auth,
        namespace: None,
        request_timeout: Duration::from_secs(5),
        rotated_by: "secret-rotator-operator".to_string(),
    }
}

fn secret(value: &str) -> GeneratedSecret {
    GeneratedSecret::new(value.to_string())
}

#[tokio::test]
async fn test_write_posts_kv2_body_with_token() {
    init_rustls();
    let fake = FakeVault::new();
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let store = VaultSecretStore::new(config(
        address,
        VaultAuthConfig::Token(Zeroizing::new("s.static".to_string())),
    ))
    .unwrap();

    store
        .write("secret/data/payments/orders-db", secret("hunter2"))
        .await
        .unwrap();

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "secret/data/payments/orders-db");
    assert_eq!(requests[0].token.as_deref(), Some("s.static"));
    assert_eq!(requests[0].namespace, None);
    assert_eq!(
        requests[0].body,
        json!({"data": {"password": "hunter2", "rotated_by": "secret-rotator-operator"}})
    );
}

#[tokio::test]
async fn test_namespace_header_is_sent() {
    init_rustls();
    let fake = FakeVault::new();
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let mut cfg = config(address, VaultAuthConfig::None);
    cfg.namespace = Some("team-a".to_string());
    let store = VaultSecretStore::new(cfg).unwrap();

    store.write("kv/data/app", secret("pw")).await.unwrap();

    let requests = fake.requests();
    assert_eq!(requests[0].namespace.as_deref(), Some("team-a"));
    assert_eq!(requests[0].token, None);
}

#[tokio::test]
async fn test_server_error_is_rejected_with_status() {
    init_rustls();
    let fake = FakeVault::new();
    fake.set_write_status(StatusCode::SERVICE_UNAVAILABLE);
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let store = VaultSecretStore::new(config(address, VaultAuthConfig::None)).unwrap();

    let err = store.write("kv/data/app", secret("pw")).await.unwrap_err();

    match err {
        StoreError::Rejected { path, status, body } => {
            assert_eq!(path, "kv/data/app");
            assert_eq!(status, 503);
            assert!(body.contains("write failed"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_never_contains_password() {
    init_rustls();
    let fake = FakeVault::new();
    fake.set_write_status(StatusCode::BAD_REQUEST);
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let store = VaultSecretStore::new(config(address, VaultAuthConfig::None)).unwrap();

    let err = store
        .write("kv/data/app", secret("do-not-leak-me"))
        .await
        .unwrap_err();

    assert!(!err.to_string().contains("do-not-leak-me"));
    assert!(!format!("{err:?}").contains("do-not-leak-me"));
}

#[tokio::test]
async fn test_forbidden_is_authentication_error() {
    init_rustls();
    let fake = FakeVault::new();
    fake.set_write_status(StatusCode::FORBIDDEN);
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let store = VaultSecretStore::new(config(
        address,
        VaultAuthConfig::Token(Zeroizing::new("s.revoked".to_string())),
    ))
    .unwrap();

    let err = store.write("kv/data/app", secret("pw")).await.unwrap_err();

    assert!(matches!(err, StoreError::Authentication(_)));
}

fn sa_token_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "sa-jwt").unwrap();
    file
}

fn kubernetes_auth(token_file: &tempfile::NamedTempFile) -> VaultAuthConfig {
    VaultAuthConfig::Kubernetes {
        role: "rotator".to_string(),
        mount: "kubernetes".to_string(),
        token_path: token_file.path().to_path_buf(),
    }
}

#[tokio::test]
async fn test_kubernetes_login_token_is_cached() {
    init_rustls();
    let fake = FakeVault::new();
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let token_file = sa_token_file();
    let store = VaultSecretStore::new(config(address, kubernetes_auth(&token_file))).unwrap();

    store.write("kv/data/a", secret("one")).await.unwrap();
    store.write("kv/data/b", secret("two")).await.unwrap();

    assert_eq!(fake.logins(), 1);
    let requests = fake.requests();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["auth/kubernetes/login", "kv/data/a", "kv/data/b"]);
    assert_eq!(requests[0].body, json!({"role": "rotator", "jwt": "sa-jwt"}));
    assert_eq!(requests[1].token.as_deref(), Some("k8s-token-1"));
    assert_eq!(requests[2].token.as_deref(), Some("k8s-token-1"));
}

#[tokio::test]
async fn test_unauthorized_write_forces_new_login() {
    init_rustls();
    let fake = FakeVault::new();
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let token_file = sa_token_file();
    let store = VaultSecretStore::new(config(address, kubernetes_auth(&token_file))).unwrap();

    fake.set_write_status(StatusCode::UNAUTHORIZED);
    let err = store.write("kv/data/a", secret("one")).await.unwrap_err();
    assert!(matches!(err, StoreError::Authentication(_)));

    fake.set_write_status(StatusCode::NO_CONTENT);
    store.write("kv/data/a", secret("two")).await.unwrap();

    assert_eq!(fake.logins(), 2);
    let last = fake.requests().pop().unwrap();
    assert_eq!(last.token.as_deref(), Some("k8s-token-2"));
}

#[tokio::test]
async fn test_missing_service_account_token_is_configuration_error() {
    init_rustls();
    let fake = FakeVault::new();
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let store = VaultSecretStore::new(config(
        address,
        VaultAuthConfig::Kubernetes {
            role: "rotator".to_string(),
            mount: "kubernetes".to_string(),
            token_path: "/nonexistent/serviceaccount/token".into(),
        },
    ))
    .unwrap();

    let err = store.write("kv/data/a", secret("pw")).await.unwrap_err();

    assert!(matches!(err, StoreError::Configuration(_)));
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_login_is_authentication_error() {
    init_rustls();
    let fake = FakeVault::new();
    let address = start_fake_vault(Arc::clone(&fake)).await;
    let token_file = sa_token_file();
    let store = VaultSecretStore::new(config(
        address,
        VaultAuthConfig::Kubernetes {
            role: "someone-else".to_string(),
            mount: "kubernetes".to_string(),
            token_path: token_file.path().to_path_buf(),
        },
    ))
    .unwrap();

    let err = store.write("kv/data/a", secret("pw")).await.unwrap_err();

    assert!(matches!(err, StoreError::Authentication(_)));
    assert_eq!(fake.logins(), 0);
    assert_eq!(fake.requests().len(), 1);
}
