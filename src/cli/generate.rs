//! # Generate Command

use anyhow::{Context, Result};
use secret_rotator::rotation::{CredentialGenerator, DEFAULT_PASSWORD_LENGTH};

/// Print one password to stdout
pub fn generate_command(length: u32, symbols: bool) -> Result<()> {
    let length = if length == 0 {
        DEFAULT_PASSWORD_LENGTH
    } else {
        length
    };

    let secret = CredentialGenerator::default()
        .generate(usize::try_from(length)?, symbols)
        .context("Failed to generate password")?;
    println!("{}", secret.expose());
    Ok(())
}
