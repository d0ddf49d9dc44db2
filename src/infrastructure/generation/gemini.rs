//! Gemini `generateContent` provider

use async_trait::async_trait;
use serde::Deserialize;

use super::http_client::HttpClientTrait;
use crate::domain::credentials::SecretValue;
use crate::domain::generation::{
    GenerationOutput, GenerationProvider, GenerationRequest, InlineImage,
};
use crate::domain::DomainError;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const PROVIDER: &str = "gemini";

/// Gemini REST API provider
#[derive(Debug)]
pub struct GeminiProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> GeminiProvider<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn build_request(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut parts = vec![serde_json::json!({ "text": request.prompt })];

        if let Some(ref image) = request.reference_image {
            parts.push(serde_json::json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": image.data,
                }
            }));
        }

        let mut body = serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
        });

        if request.kind.produces_image() {
            body["generationConfig"] = serde_json::json!({
                "responseModalities": ["TEXT", "IMAGE"]
            });
        }

        body
    }

    fn parse_response(
        &self,
        request: &GenerationRequest,
        json: serde_json::Value,
    ) -> Result<GenerationOutput, DomainError> {
        let response: GeminiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::upstream(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        if let Some(reason) = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(DomainError::upstream(
                PROVIDER,
                format!("Prompt blocked: {}", reason),
            ));
        }

        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        let mut text = String::new();
        let mut image = None;

        for part in parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if image.is_none() {
                if let Some(data) = part.inline_data {
                    image = Some(InlineImage::new(data.mime_type, data.data));
                }
            }
        }

        let text = Some(text.trim().to_string()).filter(|t| !t.is_empty());

        if request.kind.produces_image() {
            let image = image
                .ok_or_else(|| DomainError::upstream(PROVIDER, "No image in response"))?;
            return Ok(GenerationOutput::image(image, text));
        }

        text.map(GenerationOutput::text)
            .ok_or_else(|| DomainError::upstream(PROVIDER, "No text in response"))
    }
}

#[async_trait]
impl<C: HttpClientTrait> GenerationProvider for GeminiProvider<C> {
    async fn generate(
        &self,
        api_key: &SecretValue,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, DomainError> {
        let url = self.generate_url(&request.model);
        let body = self.build_request(request);
        let headers = vec![
            ("x-goog-api-key", api_key.expose()),
            ("Content-Type", "application/json"),
        ];

        let response = self
            .client
            .post_json(&url, headers, &body)
            .await
            .map_err(as_gemini_error)?;

        self.parse_response(request, response)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

fn as_gemini_error(error: DomainError) -> DomainError {
    match error {
        DomainError::Upstream {
            status, message, ..
        } => DomainError::Upstream {
            provider: PROVIDER.to_string(),
            status,
            message,
        },
        other => other,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}
