//! Credential domain: sealed secrets and resolution provenance

mod provenance;
mod secret;

pub use provenance::{CredentialProvenance, ResolvedCredential};
pub use secret::{EncryptedSecret, SecretValue};
