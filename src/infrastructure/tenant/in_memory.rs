//! In-memory settings repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::tenant::{
    ClubAiSettings, ClubId, OrganizationAiSettings, OrganizationId, SettingsRepository,
};
use crate::domain::DomainError;

/// In-memory implementation of SettingsRepository
#[derive(Debug, Default)]
pub struct InMemorySettingsRepository {
    organizations: Arc<RwLock<HashMap<String, OrganizationAiSettings>>>,
    clubs: Arc<RwLock<HashMap<String, ClubAiSettings>>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with rows
    pub fn with_rows(organizations: Vec<OrganizationAiSettings>, clubs: Vec<ClubAiSettings>) -> Self {
        let organizations = organizations
            .into_iter()
            .map(|o| (o.organization_id().as_str().to_string(), o))
            .collect();
        let clubs = clubs
            .into_iter()
            .map(|c| (c.club_id().as_str().to_string(), c))
            .collect();

        Self {
            organizations: Arc::new(RwLock::new(organizations)),
            clubs: Arc::new(RwLock::new(clubs)),
        }
    }

    /// Register a club row, as the external club CRUD would
    pub async fn insert_club(&self, club: ClubAiSettings) {
        self.clubs
            .write()
            .await
            .insert(club.club_id().as_str().to_string(), club);
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn get_organization(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationAiSettings>, DomainError> {
        let organizations = self.organizations.read().await;
        Ok(organizations.get(id.as_str()).cloned())
    }

    async fn get_club(&self, id: &ClubId) -> Result<Option<ClubAiSettings>, DomainError> {
        let clubs = self.clubs.read().await;
        Ok(clubs.get(id.as_str()).cloned())
    }

    async fn save_organization(&self, settings: &OrganizationAiSettings) -> Result<(), DomainError> {
        let mut organizations = self.organizations.write().await;
        organizations.insert(
            settings.organization_id().as_str().to_string(),
            settings.clone(),
        );
        Ok(())
    }

    async fn save_club(&self, settings: &ClubAiSettings) -> Result<(), DomainError> {
        let mut clubs = self.clubs.write().await;

        match clubs.get_mut(settings.club_id().as_str()) {
            Some(existing) if existing.belongs_to(settings.organization_id()) => {
                *existing = settings.clone();
                Ok(())
            }
            _ => Err(DomainError::not_found(format!(
                "Club '{}' not found in organization '{}'",
                settings.club_id(),
                settings.organization_id()
            ))),
        }
    }
}
