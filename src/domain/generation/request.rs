use serde::{Deserialize, Serialize};

/// What the caller asks the upstream model to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Text,
    Image,
    /// Image generation conditioned on a reference image
    ImageEdit,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::ImageEdit => "image_edit",
        }
    }

    pub fn produces_image(&self) -> bool {
        matches!(self, Self::Image | Self::ImageEdit)
    }
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base64 encoded binary payload with its mime type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    /// Standard base64, no data-URL prefix
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Approximate decoded size in bytes
    pub fn approx_bytes(&self) -> u64 {
        (self.data.len() as u64 * 3) / 4
    }
}

/// A fully validated request for the upstream provider
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub model: String,
    pub prompt: String,
    pub reference_image: Option<InlineImage>,
}

impl GenerationRequest {
    pub fn new(kind: GenerationKind, model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            prompt: prompt.into(),
            reference_image: None,
        }
    }

    pub fn with_reference_image(mut self, image: InlineImage) -> Self {
        self.reference_image = Some(image);
        self
    }

    /// Approximate input size recorded in usage events
    pub fn input_size(&self) -> u64 {
        let prompt = self.prompt.chars().count() as u64;
        let reference = self
            .reference_image
            .as_ref()
            .map(InlineImage::approx_bytes)
            .unwrap_or(0);

        prompt + reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_size_counts_prompt_and_reference() {
        let text = GenerationRequest::new(GenerationKind::Text, "m", "héllo");
        assert_eq!(text.input_size(), 5);

        let edit = GenerationRequest::new(GenerationKind::ImageEdit, "m", "abc")
            .with_reference_image(InlineImage::new("image/png", "AAAA"));
        assert_eq!(edit.input_size(), 6);
    }
}
