//! # Rotate Command
//!
//! Requests an out-of-schedule rotation by stamping the rotate-request
//! annotation with the current time. The operator rotates once per new value.

use anyhow::{Context, Result};
use kube::{api::Api, api::Patch, api::PatchParams, Client};
use secret_rotator::constants::ROTATE_REQUEST_ANNOTATION;
use secret_rotator::crd::SecretRotation;
use serde_json::json;

pub async fn rotate_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<SecretRotation> = Api::namespaced(client, ns);

    let resource = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get SecretRotation '{ns}/{name}'"))?;
    if resource.spec.suspend {
        anyhow::bail!(
            "SecretRotation '{ns}/{name}' is suspended; run `rotctl resume {name} -n {ns}` first"
        );
    }

    let requested_at = chrono::Utc::now().to_rfc3339();
    let patch = json!({
        "metadata": {
            "annotations": {
                ROTATE_REQUEST_ANNOTATION: requested_at
            }
        }
    });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(patch))
        .await
        .with_context(|| format!("Failed to patch SecretRotation '{ns}/{name}'"))?;

    println!("Rotation requested for SecretRotation '{ns}/{name}' at {requested_at}");
    Ok(())
}
