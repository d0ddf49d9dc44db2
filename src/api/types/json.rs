//! JSON body extractor and responder
//!
//! Body rejections come back as an [`ApiError`] so a handler can take
//! `Result<Json<T>, ApiError>` and decide when to surface them.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use super::error::{ApiError, ApiErrorType};

#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        axum::Json::<T>::from_request(req, state)
            .await
            .map(|axum::Json(value)| Json(value))
            .map_err(body_error)
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Keeps axum's status (400, 413, 415, 422) with the gateway's error body
fn body_error(rejection: JsonRejection) -> ApiError {
    let message = match &rejection {
        JsonRejection::JsonDataError(e) => format!("Invalid request body: {}", e.body_text()),
        JsonRejection::JsonSyntaxError(e) => format!("Malformed JSON: {}", e.body_text()),
        JsonRejection::MissingJsonContentType(_) => {
            "Content-Type must be application/json".to_string()
        }
        JsonRejection::BytesRejection(e) => format!("Unreadable request body: {}", e.body_text()),
        other => other.body_text(),
    };

    ApiError::new(rejection.status(), ApiErrorType::InvalidRequestError, message)
        .with_code("json_parse_error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{header, StatusCode}};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Prompt {
        prompt: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/v1/generate");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_extracts_body() {
        let Json(body) = Json::<Prompt>::from_request(
            request(Some("application/json"), r#"{"prompt":"a lighthouse"}"#),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(body.prompt, "a lighthouse");
    }

    #[tokio::test]
    async fn test_syntax_error_is_bad_request() {
        let err = Json::<Prompt>::from_request(request(Some("application/json"), "{"), &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.code.as_deref(), Some("json_parse_error"));
        assert!(err.response.error.message.starts_with("Malformed JSON"));
    }

    #[tokio::test]
    async fn test_missing_field_keeps_unprocessable_status() {
        let err = Json::<Prompt>::from_request(request(Some("application/json"), "{}"), &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.response.error.error_type, ApiErrorType::InvalidRequestError);
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let err = Json::<Prompt>::from_request(request(None, r#"{"prompt":"x"}"#), &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
