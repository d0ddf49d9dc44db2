//! Settings repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::{ClubAiSettings, ClubId, OrganizationAiSettings, OrganizationId};
use crate::domain::DomainError;

/// Read/write access to the organization and club AI settings rows
///
/// Rows that cannot be decoded (unknown mode, half-populated credential)
/// must be reported as errors, never as absent or empty.
#[async_trait]
pub trait SettingsRepository: Send + Sync + Debug {
    /// Get an organization settings row
    async fn get_organization(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationAiSettings>, DomainError>;

    /// Get a club settings row, including its parent organization
    async fn get_club(&self, id: &ClubId) -> Result<Option<ClubAiSettings>, DomainError>;

    /// Create or replace an organization settings row
    async fn save_organization(&self, settings: &OrganizationAiSettings) -> Result<(), DomainError>;

    /// Update mode and credential of an existing club row
    ///
    /// The parent organization link is never rewritten; saving a club under a
    /// different organization than the stored one fails with `NotFound`.
    async fn save_club(&self, settings: &ClubAiSettings) -> Result<(), DomainError>;
}
