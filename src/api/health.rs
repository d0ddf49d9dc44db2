//! Health, liveness and metrics endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Reports degraded when requests without an override would fail
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let platform = if state.gateway.has_platform_key() {
        HealthCheck {
            name: "platform_credential".to_string(),
            status: HealthStatus::Healthy,
            message: None,
        }
    } else {
        HealthCheck {
            name: "platform_credential".to_string(),
            status: HealthStatus::Degraded,
            message: Some("No platform API key; only BYOK tenants can generate".to_string()),
        }
    };

    let response = HealthResponse {
        status: platform.status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: vec![platform],
    };

    (StatusCode::OK, Json(response))
}

/// Liveness probe
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Prometheus exposition, 404 when metrics are disabled
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(ref metrics) => metrics.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
