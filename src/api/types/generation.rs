//! Generation route bodies

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::credentials::CredentialProvenance;
use crate::domain::generation::{GenerationKind, InlineImage};
use crate::infrastructure::gateway::GenerationResult;

/// Body of `POST /v1/generate`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 64))]
    pub organization_id: String,
    #[validate(length(min = 1, max = 64))]
    pub club_id: Option<String>,
    pub kind: GenerationKind,
    #[validate(length(min = 1, max = 32000))]
    pub prompt: String,
    #[validate(length(min = 1, max = 128))]
    pub model: Option<String>,
    #[validate(nested)]
    pub reference_image: Option<ReferenceImage>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReferenceImage {
    #[validate(length(min = 1, max = 64))]
    pub mime_type: String,
    /// Base64, at most ~7.5 MB decoded
    #[validate(length(min = 1, max = 10_000_000))]
    pub data: String,
}

impl From<ReferenceImage> for InlineImage {
    fn from(image: ReferenceImage) -> Self {
        InlineImage::new(image.mime_type, image.data)
    }
}

/// Successful generation body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub provenance: CredentialProvenance,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            text: result.output.text,
            image: result.output.image,
            description: result.output.description,
            provenance: result.provenance,
        }
    }
}
