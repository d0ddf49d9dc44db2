//! HTTP request and response types

pub mod error;
pub mod generation;
pub mod json;
pub mod settings;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use generation::{GenerateRequest, GenerateResponse, ReferenceImage};
pub use json::Json;
pub use settings::UpdateAiSettingsBody;

use validator::Validate;

/// Run derived field validation, mapping failures to a 400
pub fn validate_body<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid request: {}", e)).with_code("validation_error"))
}
