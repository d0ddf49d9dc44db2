//! Domain layer - Core gateway entities and collaborator traits

pub mod credentials;
pub mod error;
pub mod generation;
pub mod rate_limit;
pub mod tenant;
pub mod usage;

pub use credentials::{CredentialProvenance, EncryptedSecret, ResolvedCredential, SecretValue};
pub use error::DomainError;
pub use generation::{
    GenerationKind, GenerationOutput, GenerationProvider, GenerationRequest, InlineImage,
};
pub use rate_limit::{LimitScope, RateLimitDecision, RateLimitPolicy, RateLimitStore};
pub use tenant::{
    ClubAiMode, ClubAiSettings, ClubId, CredentialSlot, OrganizationAiMode,
    OrganizationAiSettings, OrganizationId, SettingsRepository,
};
pub use usage::{UsageEvent, UsageEventId, UsageLog, UsageOutcome};
