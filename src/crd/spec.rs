//! # SecretRotation Spec

use crate::rotation::RotationPolicy;
use serde::{Deserialize, Serialize};

/// SecretRotation Custom Resource Definition
///
/// Declares one password that the operator regenerates every
/// `rotationInterval` and writes to Vault at `storePath`.
///
/// # Example
///
/// ```yaml
/// apiVersion: rotation.security.io/v1alpha1
/// kind: SecretRotation
/// metadata:
///   name: orders-db
///   namespace: payments
/// spec:
///   rotationInterval: 24h
///   passwordLength: 32
///   includeSymbols: true
///   storePath: secret/data/payments/orders-db
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "SecretRotation",
    group = "rotation.security.io",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::SecretRotationStatus",
    shortname = "rot",
    printcolumn = r#"{"name":"Interval", "type":"string", "jsonPath":".spec.rotationInterval"}, {"name":"Status", "type":"string", "jsonPath":".status.status"}, {"name":"Last Rotated", "type":"string", "jsonPath":".status.lastRotatedTime"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SecretRotationSpec {
    /// How often to rotate, e.g. "30m", "24h", "7d", "1h30m"
    pub rotation_interval: String,
    /// Length of generated passwords; 0 or unset means 16
    #[serde(default)]
    pub password_length: u32,
    /// Add punctuation symbols to the alphanumeric alphabet
    #[serde(default)]
    pub include_symbols: bool,
    /// Vault path the password is written to (KV v2: include `data/`)
    #[serde(alias = "vaultPath")]
    pub store_path: String,
    /// Skip rotation until cleared
    #[serde(default)]
    pub suspend: bool,
}

impl SecretRotationSpec {
    #[must_use]
    pub fn policy(&self) -> RotationPolicy {
        RotationPolicy {
            interval: self.rotation_interval.clone(),
            password_length: self.password_length,
            include_symbols: self.include_symbols,
            store_path: self.store_path.clone(),
        }
    }
}
