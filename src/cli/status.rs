//! # Status Command

use anyhow::{Context, Result};
use kube::{api::Api, Client};
use secret_rotator::crd::SecretRotation;
use secret_rotator::rotation::parse_interval;

/// Show detailed status of a SecretRotation resource
pub async fn status_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<SecretRotation> = Api::namespaced(client, ns);

    let rotation = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get SecretRotation '{ns}/{name}'"))?;

    println!("Status for SecretRotation '{ns}/{name}'");
    println!();
    println!("Spec:");
    match parse_interval(&rotation.spec.rotation_interval) {
        Ok(interval) => println!(
            "  Rotation Interval: {} ({}s)",
            rotation.spec.rotation_interval,
            interval.as_secs()
        ),
        Err(e) => println!(
            "  Rotation Interval: {} (invalid: {e})",
            rotation.spec.rotation_interval
        ),
    }
    println!(
        "  Password Length: {}",
        rotation.spec.policy().effective_password_length()
    );
    println!("  Include Symbols: {}", rotation.spec.include_symbols);
    println!("  Store Path: {}", rotation.spec.store_path);
    println!("  Suspend: {}", rotation.spec.suspend);

    let Some(status) = &rotation.status else {
        println!();
        println!("Status: No status available (resource may not have been reconciled yet)");
        return Ok(());
    };

    println!();
    println!("Status:");
    println!("  Status: {}", status.status.as_deref().unwrap_or("Pending"));
    if let Some(message) = &status.message {
        println!("  Message: {message}");
    }
    println!(
        "  Last Rotated: {}",
        status.last_rotated_time.as_deref().unwrap_or("never")
    );
    if let Some(next) = &status.next_rotation_time {
        println!("  Next Attempt: {next}");
    }
    if let Some(request) = &status.last_rotate_request {
        println!("  Last Rotate Request: {request}");
    }
    if let Some(observed_generation) = status.observed_generation {
        println!("  Observed Generation: {observed_generation}");
    }

    if !status.conditions.is_empty() {
        println!();
        println!("Conditions:");
        for condition in &status.conditions {
            println!("  {}: {}", condition.r#type, condition.status);
            if let Some(reason) = &condition.reason {
                println!("    Reason: {reason}");
            }
            if let Some(last_transition_time) = &condition.last_transition_time {
                println!("    Last Transition: {last_transition_time}");
            }
        }
    }

    Ok(())
}
