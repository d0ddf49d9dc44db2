//! AI settings administration endpoint

use axum::extract::State;
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{validate_body, ApiError, Json, UpdateAiSettingsBody};
use crate::infrastructure::tenant::AiSettingsSummary;

/// PUT /admin/ai-settings
pub async fn update_ai_settings(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<UpdateAiSettingsBody>,
) -> Result<Json<AiSettingsSummary>, ApiError> {
    validate_body(&body)?;

    let summary = state.settings.update(body.into()).await?;
    info!(
        scope = summary.scope,
        organization_id = %summary.organization_id,
        club_id = summary.club_id.as_deref(),
        "AI settings updated via admin API"
    );

    Ok(Json(summary))
}
