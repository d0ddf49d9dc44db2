//! Symmetric encryption of at-rest secrets

mod secret_vault;

pub use secret_vault::{generate_master_key, SecretVault, MASTER_KEY_ENV};
