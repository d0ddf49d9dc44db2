//! PostgreSQL settings repository implementation
//!
//! Reads and writes two externally owned tables:
//!
//! - `organization_ai_settings(organization_id, ai_mode, api_key_ciphertext, api_key_iv, updated_at)`
//! - `club_ai_settings(club_id, organization_id, ai_mode, api_key_ciphertext, api_key_iv, updated_at)`

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::tenant::{
    ClubAiMode, ClubAiSettings, ClubId, CredentialSlot, OrganizationAiMode,
    OrganizationAiSettings, OrganizationId, SettingsRepository,
};
use crate::domain::DomainError;

/// PostgreSQL implementation of SettingsRepository
#[derive(Debug, Clone)]
pub struct PostgresSettingsRepository {
    pool: PgPool,
}

impl PostgresSettingsRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn get_organization(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationAiSettings>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT organization_id, ai_mode, api_key_ciphertext, api_key_iv
            FROM organization_ai_settings
            WHERE organization_id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get organization settings: {}", e)))?;

        row.as_ref().map(row_to_organization).transpose()
    }

    async fn get_club(&self, id: &ClubId) -> Result<Option<ClubAiSettings>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT club_id, organization_id, ai_mode, api_key_ciphertext, api_key_iv
            FROM club_ai_settings
            WHERE club_id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get club settings: {}", e)))?;

        row.as_ref().map(row_to_club).transpose()
    }

    async fn save_organization(&self, settings: &OrganizationAiSettings) -> Result<(), DomainError> {
        let (ciphertext, iv) = slot_to_columns(settings.credential());

        sqlx::query(
            r#"
            INSERT INTO organization_ai_settings
                (organization_id, ai_mode, api_key_ciphertext, api_key_iv, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (organization_id) DO UPDATE
            SET ai_mode = EXCLUDED.ai_mode,
                api_key_ciphertext = EXCLUDED.api_key_ciphertext,
                api_key_iv = EXCLUDED.api_key_iv,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(settings.organization_id().as_str())
        .bind(settings.mode().as_str())
        .bind(ciphertext)
        .bind(iv)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to save organization settings: {}", e)))?;

        Ok(())
    }

    async fn save_club(&self, settings: &ClubAiSettings) -> Result<(), DomainError> {
        let (ciphertext, iv) = slot_to_columns(settings.credential());

        let result = sqlx::query(
            r#"
            UPDATE club_ai_settings
            SET ai_mode = $3, api_key_ciphertext = $4, api_key_iv = $5, updated_at = NOW()
            WHERE club_id = $1 AND organization_id = $2
            "#,
        )
        .bind(settings.club_id().as_str())
        .bind(settings.organization_id().as_str())
        .bind(settings.mode().as_str())
        .bind(ciphertext)
        .bind(iv)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to save club settings: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Club '{}' not found in organization '{}'",
                settings.club_id(),
                settings.organization_id()
            )));
        }

        Ok(())
    }
}

fn slot_to_columns(slot: &CredentialSlot) -> (Option<&str>, Option<&str>) {
    match slot.sealed() {
        Some(secret) => (Some(secret.ciphertext()), Some(secret.iv())),
        None => (None, None),
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::storage(format!("Failed to read column '{}': {}", name, e)))
}

fn row_to_organization(row: &PgRow) -> Result<OrganizationAiSettings, DomainError> {
    let organization_id = OrganizationId::new(column::<String>(row, "organization_id")?)
        .map_err(|e| DomainError::storage(e.to_string()))?;
    let mode = column::<String>(row, "ai_mode")?
        .parse::<OrganizationAiMode>()
        .map_err(|e| DomainError::storage(e.to_string()))?;
    let credential = CredentialSlot::from_columns(
        column(row, "api_key_ciphertext")?,
        column(row, "api_key_iv")?,
    )?;

    Ok(OrganizationAiSettings::new(organization_id, mode).with_credential(credential))
}

fn row_to_club(row: &PgRow) -> Result<ClubAiSettings, DomainError> {
    let club_id = ClubId::new(column::<String>(row, "club_id")?)
        .map_err(|e| DomainError::storage(e.to_string()))?;
    let organization_id = OrganizationId::new(column::<String>(row, "organization_id")?)
        .map_err(|e| DomainError::storage(e.to_string()))?;
    let mode = column::<String>(row, "ai_mode")?
        .parse::<ClubAiMode>()
        .map_err(|e| DomainError::storage(e.to_string()))?;
    let credential = CredentialSlot::from_columns(
        column(row, "api_key_ciphertext")?,
        column(row, "api_key_iv")?,
    )?;

    Ok(ClubAiSettings::new(club_id, organization_id, mode).with_credential(credential))
}
