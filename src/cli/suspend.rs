//! # Suspend/Resume Commands

use anyhow::{Context, Result};
use kube::{api::Api, api::Patch, api::PatchParams, Client};
use secret_rotator::crd::SecretRotation;
use serde_json::json;

async fn set_suspend(client: Client, name: &str, ns: &str, suspend: bool) -> Result<bool> {
    let api: Api<SecretRotation> = Api::namespaced(client, ns);

    let resource = api
        .get(name)
        .await
        .with_context(|| format!("Failed to get SecretRotation '{ns}/{name}'"))?;
    if resource.spec.suspend == suspend {
        return Ok(false);
    }

    let patch = json!({ "spec": { "suspend": suspend } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(patch))
        .await
        .with_context(|| format!("Failed to patch SecretRotation '{ns}/{name}'"))?;
    Ok(true)
}

/// Suspend rotation for a SecretRotation resource
pub async fn suspend_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    println!("Suspending rotation for SecretRotation '{ns}/{name}'...");

    if set_suspend(client, &name, ns, true).await? {
        println!("Rotation suspended");
        println!("\nTo resume, run:");
        println!("   rotctl resume {name} --namespace {ns}");
    } else {
        println!("Resource is already suspended");
    }
    Ok(())
}

/// Resume rotation for a SecretRotation resource
pub async fn resume_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    println!("Resuming rotation for SecretRotation '{ns}/{name}'...");

    if set_suspend(client, &name, ns, false).await? {
        println!("Rotation resumed; the operator will reconcile shortly");
    } else {
        println!("Resource is already active (not suspended)");
    }
    Ok(())
}
