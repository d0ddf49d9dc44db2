//! Credential precedence resolution across club, organization and platform

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, error};

use crate::domain::credentials::{
    CredentialProvenance, EncryptedSecret, ResolvedCredential, SecretValue,
};
use crate::domain::tenant::{ClubId, OrganizationId, SettingsRepository};
use crate::domain::DomainError;
use crate::infrastructure::vault::SecretVault;

/// Environment variable holding the shared platform API key
pub const PLATFORM_KEY_ENV: &str = "GATEWAY_PLATFORM_API_KEY";

/// Picks the API key for a call: club override, then organization override,
/// then the platform key
///
/// Only the branch actually taken is decrypted. Any lookup or decryption
/// failure is returned as an error rather than falling through to a lower
/// tier.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    settings: Arc<dyn SettingsRepository>,
    vault: Arc<SecretVault>,
    platform_key: Option<SecretValue>,
}

impl CredentialResolver {
    pub fn new(
        settings: Arc<dyn SettingsRepository>,
        vault: Arc<SecretVault>,
        platform_key: Option<SecretValue>,
    ) -> Self {
        let platform_key = platform_key.filter(|key| !key.is_empty());
        Self {
            settings,
            vault,
            platform_key,
        }
    }

    /// Read the platform key from the environment; absent or blank yields `None`
    pub fn platform_key_from_env() -> Option<SecretValue> {
        std::env::var(PLATFORM_KEY_ENV)
            .ok()
            .map(|key| SecretValue::new(key.trim()))
            .filter(|key| !key.is_empty())
    }

    pub fn has_platform_key(&self) -> bool {
        self.platform_key.is_some()
    }

    /// Resolve the credential for an organization and optional club
    pub async fn resolve(
        &self,
        organization_id: &OrganizationId,
        club_id: Option<&ClubId>,
    ) -> Result<ResolvedCredential, DomainError> {
        let resolved = self.resolve_inner(organization_id, club_id).await?;

        counter!(
            "gateway_credential_resolutions_total",
            "provenance" => resolved.provenance.as_str()
        )
        .increment(1);
        debug!(
            organization_id = %organization_id,
            club_id = club_id.map(ClubId::as_str),
            provenance = %resolved.provenance,
            "Resolved credential"
        );

        Ok(resolved)
    }

    async fn resolve_inner(
        &self,
        organization_id: &OrganizationId,
        club_id: Option<&ClubId>,
    ) -> Result<ResolvedCredential, DomainError> {
        if let Some(club_id) = club_id {
            let club = self
                .settings
                .get_club(club_id)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("Club '{}' not found", club_id)))?;
            club.ensure_belongs_to(organization_id)?;

            if let Some(sealed) = club.override_credential() {
                let api_key = self.unseal(sealed, "club", club_id.as_str())?;
                return Ok(ResolvedCredential::new(api_key, CredentialProvenance::ClubOverride));
            }
        }

        match self.settings.get_organization(organization_id).await? {
            Some(organization) => {
                if let Some(sealed) = organization.override_credential() {
                    let api_key = self.unseal(sealed, "organization", organization_id.as_str())?;
                    return Ok(ResolvedCredential::new(api_key, CredentialProvenance::OrgOverride));
                }
            }
            None => {
                debug!(organization_id = %organization_id, "No organization AI settings, using managed mode");
            }
        }

        self.platform_key
            .clone()
            .map(|api_key| ResolvedCredential::new(api_key, CredentialProvenance::PlatformDefault))
            .ok_or_else(|| {
                DomainError::configuration("No platform API key configured and no override applies")
            })
    }

    fn unseal(&self, sealed: &EncryptedSecret, scope: &str, id: &str) -> Result<SecretValue, DomainError> {
        let api_key = self.vault.decrypt(sealed).map_err(|e| {
            error!(
                scope,
                id,
                error = %e,
                "Failed to decrypt stored API key; the master key may have changed without re-encrypting stored keys"
            );
            e
        })?;

        if api_key.is_empty() {
            return Err(DomainError::configuration(format!(
                "Stored API key for {} '{}' is empty",
                scope, id
            )));
        }

        Ok(api_key)
    }
}
