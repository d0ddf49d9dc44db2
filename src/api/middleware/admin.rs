//! Static admin token guard

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Header carrying the admin token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Extractor that requires the configured admin token
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .admin_token
            .as_ref()
            .ok_or_else(|| ApiError::forbidden("Admin API is disabled"))?;

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Admin token required"))?;

        if !constant_time_eq(provided.as_bytes(), expected.expose().as_bytes()) {
            warn!("Rejected admin request with invalid token");
            return Err(ApiError::unauthorized("Invalid admin token"));
        }

        Ok(RequireAdmin)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
