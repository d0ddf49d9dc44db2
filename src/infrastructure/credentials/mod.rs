//! Credential resolution infrastructure

mod resolver;

pub use resolver::{CredentialResolver, PLATFORM_KEY_ENV};
