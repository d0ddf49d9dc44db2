//! Tenancy scopes: organizations (tenants) and clubs (sub-tenants)

mod entity;
mod repository;

pub use entity::{
    ClubAiMode, ClubAiSettings, ClubId, CredentialSlot, OrganizationAiMode,
    OrganizationAiSettings, OrganizationId,
};
pub use repository::SettingsRepository;
