//! AI settings administration service

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::tenant::{
    ClubAiMode, ClubId, CredentialSlot, OrganizationAiMode, OrganizationAiSettings,
    OrganizationId, SettingsRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::vault::SecretVault;

/// Request to change the AI settings of one scope
#[derive(Debug, Clone)]
pub struct UpdateAiSettingsRequest {
    /// `organization` or `club`
    pub scope: String,
    pub organization_id: String,
    pub club_id: Option<String>,
    pub mode: String,
    /// Plaintext key to adopt; sealed before it is stored
    pub api_key: Option<String>,
    /// Remove the stored key
    pub clear_api_key: bool,
}

/// Settings as reported back to administrators, never including the key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiSettingsSummary {
    pub scope: &'static str,
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<String>,
    pub mode: &'static str,
    pub has_api_key: bool,
}

enum KeyChange {
    Keep,
    Replace(String),
    Clear,
}

impl KeyChange {
    fn from_request(api_key: Option<String>, clear: bool) -> Result<Self, DomainError> {
        match (api_key, clear) {
            (Some(_), true) => Err(DomainError::validation(
                "api_key and clear_api_key cannot be combined",
            )),
            (Some(key), false) => {
                let key = key.trim().to_string();
                if key.is_empty() {
                    return Err(DomainError::validation("api_key cannot be empty"));
                }
                Ok(Self::Replace(key))
            }
            (None, true) => Ok(Self::Clear),
            (None, false) => Ok(Self::Keep),
        }
    }

    fn apply(self, vault: &SecretVault, current: &CredentialSlot) -> Result<CredentialSlot, DomainError> {
        match self {
            Self::Keep => Ok(current.clone()),
            Self::Replace(key) => Ok(CredentialSlot::Sealed(vault.encrypt(&key)?)),
            Self::Clear => Ok(CredentialSlot::Empty),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Keep => "kept",
            Self::Replace(_) => "replaced",
            Self::Clear => "cleared",
        }
    }
}

/// Applies administrative AI settings changes, sealing keys via the vault
#[derive(Debug, Clone)]
pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
    vault: Arc<SecretVault>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepository>, vault: Arc<SecretVault>) -> Self {
        Self { repository, vault }
    }

    /// Validate and apply a settings change
    pub async fn update(
        &self,
        request: UpdateAiSettingsRequest,
    ) -> Result<AiSettingsSummary, DomainError> {
        let organization_id = OrganizationId::new(request.organization_id)?;
        let key_change = KeyChange::from_request(request.api_key, request.clear_api_key)?;

        match request.scope.as_str() {
            "organization" => {
                if request.club_id.is_some() {
                    return Err(DomainError::validation(
                        "club_id is not allowed for organization scope",
                    ));
                }
                let mode = request.mode.parse::<OrganizationAiMode>()?;
                self.update_organization(organization_id, mode, key_change).await
            }
            "club" => {
                let club_id = request
                    .club_id
                    .ok_or_else(|| DomainError::validation("club_id is required for club scope"))?;
                let club_id = ClubId::new(club_id)?;
                let mode = request.mode.parse::<ClubAiMode>()?;
                self.update_club(organization_id, club_id, mode, key_change).await
            }
            other => Err(DomainError::validation(format!(
                "Unknown settings scope '{}', expected 'organization' or 'club'",
                other
            ))),
        }
    }

    async fn update_organization(
        &self,
        organization_id: OrganizationId,
        mode: OrganizationAiMode,
        key_change: KeyChange,
    ) -> Result<AiSettingsSummary, DomainError> {
        let mut settings = self
            .repository
            .get_organization(&organization_id)
            .await?
            .unwrap_or_else(|| OrganizationAiSettings::new(organization_id.clone(), mode));

        let key_action = key_change.label();
        let credential = key_change.apply(&self.vault, settings.credential())?;
        settings.set_mode(mode);
        settings.set_credential(credential);

        self.repository.save_organization(&settings).await?;

        info!(
            organization_id = %organization_id,
            mode = %mode,
            api_key = key_action,
            "Organization AI settings updated"
        );

        Ok(AiSettingsSummary {
            scope: "organization",
            organization_id: organization_id.to_string(),
            club_id: None,
            mode: mode.as_str(),
            has_api_key: settings.credential().is_configured(),
        })
    }

    async fn update_club(
        &self,
        organization_id: OrganizationId,
        club_id: ClubId,
        mode: ClubAiMode,
        key_change: KeyChange,
    ) -> Result<AiSettingsSummary, DomainError> {
        let mut settings = self
            .repository
            .get_club(&club_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Club '{}' not found", club_id)))?;
        settings.ensure_belongs_to(&organization_id)?;

        let key_action = key_change.label();
        let credential = key_change.apply(&self.vault, settings.credential())?;
        settings.set_mode(mode);
        settings.set_credential(credential);

        self.repository.save_club(&settings).await?;

        info!(
            organization_id = %organization_id,
            club_id = %club_id,
            mode = %mode,
            api_key = key_action,
            "Club AI settings updated"
        );

        Ok(AiSettingsSummary {
            scope: "club",
            organization_id: organization_id.to_string(),
            club_id: Some(club_id.to_string()),
            mode: mode.as_str(),
            has_api_key: settings.credential().is_configured(),
        })
    }
}
