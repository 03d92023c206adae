//! # List Command

use anyhow::{Context, Result};
use kube::{api::Api, Client};
use secret_rotator::crd::SecretRotation;

/// List SecretRotation resources in one namespace, or all of them
pub async fn list_command(client: Client, namespace: Option<String>) -> Result<()> {
    let api: Api<SecretRotation> = if let Some(ns) = &namespace {
        println!("Listing SecretRotation resources in namespace '{ns}'...");
        Api::namespaced(client, ns)
    } else {
        println!("Listing SecretRotation resources in all namespaces...");
        Api::all(client)
    };

    let rotations = api
        .list(&kube::api::ListParams::default())
        .await
        .context("Failed to list SecretRotation resources")?;

    if rotations.items.is_empty() {
        println!("No SecretRotation resources found.");
        return Ok(());
    }

    println!(
        "\n{:<30} {:<20} {:<10} {:<16} {:<26} {:<8}",
        "NAME", "NAMESPACE", "INTERVAL", "STATUS", "LAST ROTATED", "SUSPEND"
    );
    println!("{}", "-".repeat(113));

    for rotation in rotations.items {
        let name = rotation.metadata.name.as_deref().unwrap_or("<unknown>");
        let ns = rotation.metadata.namespace.as_deref().unwrap_or("<unknown>");
        let interval = rotation.spec.rotation_interval.as_str();
        let suspend = if rotation.spec.suspend { "Yes" } else { "No" };

        let status = rotation
            .status
            .as_ref()
            .and_then(|s| s.status.as_deref())
            .unwrap_or("Pending");
        let last_rotated = rotation
            .status
            .as_ref()
            .and_then(|s| s.last_rotated_time.as_deref())
            .unwrap_or("never");

        println!(
            "{name:<30} {ns:<20} {interval:<10} {status:<16} {last_rotated:<26} {suspend:<8}"
        );
    }

    Ok(())
}
