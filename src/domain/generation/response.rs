use serde::{Deserialize, Serialize};

use super::InlineImage;

/// What the upstream provider produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
    /// Text returned alongside an image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GenerationOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn image(image: InlineImage, description: Option<String>) -> Self {
        Self {
            text: None,
            image: Some(image),
            description,
        }
    }

    /// Approximate output size recorded in usage events
    pub fn output_size(&self) -> u64 {
        match (&self.image, &self.text) {
            (Some(image), _) => image.approx_bytes(),
            (None, Some(text)) => text.chars().count() as u64,
            (None, None) => 0,
        }
    }
}
