use async_trait::async_trait;
use std::fmt::Debug;

use super::{GenerationOutput, GenerationRequest};
use crate::domain::credentials::SecretValue;
use crate::domain::DomainError;

/// Trait for the upstream generative AI provider
#[async_trait]
pub trait GenerationProvider: Send + Sync + Debug {
    /// Run one generation with the given credential, no retries
    async fn generate(
        &self,
        api_key: &SecretValue,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
