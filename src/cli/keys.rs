//! Master key and sealing helpers

use std::io::Read;

use serde::Serialize;

use crate::infrastructure::vault::{self, SecretVault};

#[derive(Debug, Serialize)]
struct SealedOutput {
    api_key_ciphertext: String,
    api_key_iv: String,
}

/// Print a new master key
pub fn generate_master_key() -> anyhow::Result<()> {
    println!("{}", vault::generate_master_key());
    Ok(())
}

/// Read a plaintext key from stdin and print the column values to store
pub fn seal() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let vault = SecretVault::from_env()?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let plaintext = input.trim();
    if plaintext.is_empty() {
        anyhow::bail!("No API key on stdin");
    }

    let sealed = vault.encrypt(plaintext)?;
    let output = SealedOutput {
        api_key_ciphertext: sealed.ciphertext().to_string(),
        api_key_iv: sealed.iv().to_string(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
