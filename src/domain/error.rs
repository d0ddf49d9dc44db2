use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Stored ciphertext failed authentication (tampering or wrong master key)
    #[error("Decryption error: {message}")]
    Decryption { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Failure reported by the upstream AI provider, status preserved when known
    #[error("Upstream error: {provider} - {message}")]
    Upstream {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn upstream_status(
        provider: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            provider: provider.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Short label used for metrics and usage metadata
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation",
            Self::Configuration { .. } => "configuration",
            Self::Decryption { .. } => "decryption",
            Self::Storage { .. } => "storage",
            Self::Upstream { .. } => "upstream",
            Self::Internal { .. } => "internal",
        }
    }
}
