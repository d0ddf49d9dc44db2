//! Tenant settings infrastructure implementations

mod in_memory;
mod postgres_repository;
mod service;

pub use in_memory::InMemorySettingsRepository;
pub use postgres_repository::PostgresSettingsRepository;
pub use service::{AiSettingsSummary, SettingsService, UpdateAiSettingsRequest};
