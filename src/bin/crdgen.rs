//! # CRD Generator
//!
//! Prints the `SecretRotation` CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/secretrotation.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use secret_rotator::crd::SecretRotation;

fn main() -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&SecretRotation::crd())?;
    print!("{yaml}");
    Ok(())
}
