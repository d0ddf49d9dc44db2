//! Admin settings bodies

use serde::Deserialize;
use validator::Validate;

use crate::infrastructure::tenant::UpdateAiSettingsRequest;

/// Body of `PUT /admin/ai-settings`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAiSettingsBody {
    #[validate(length(min = 1))]
    pub scope: String,
    #[validate(length(min = 1, max = 64))]
    pub organization_id: String,
    #[validate(length(min = 1, max = 64))]
    pub club_id: Option<String>,
    #[validate(length(min = 1))]
    pub mode: String,
    #[validate(length(min = 1, max = 512))]
    pub api_key: Option<String>,
    #[serde(default)]
    pub clear_api_key: bool,
}

impl From<UpdateAiSettingsBody> for UpdateAiSettingsRequest {
    fn from(body: UpdateAiSettingsBody) -> Self {
        Self {
            scope: body.scope,
            organization_id: body.organization_id,
            club_id: body.club_id,
            mode: body.mode,
            api_key: body.api_key,
            clear_api_key: body.clear_api_key,
        }
    }
}
