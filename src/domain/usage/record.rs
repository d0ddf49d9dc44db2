//! Usage event entity

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::credentials::CredentialProvenance;
use crate::domain::tenant::{ClubId, OrganizationId};

/// Unique identifier for a usage event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageEventId(String);

impl UsageEventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique ID
    pub fn generate() -> Self {
        Self(format!("usage-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UsageEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome column of a usage row
///
/// Only completed calls are recorded, so `success` is the single value the
/// gateway writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageOutcome {
    Success,
}

impl UsageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
        }
    }
}

/// Append-only record of one completed upstream AI call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    id: UsageEventId,
    pub organization_id: OrganizationId,
    pub club_id: Option<ClubId>,
    pub user_id: Option<String>,
    /// Action label, e.g. `text` or `image_edit`
    pub action: String,
    pub outcome: UsageOutcome,
    /// Approximate input size (prompt characters plus reference bytes)
    pub input_size: u64,
    /// Approximate output size (text characters or image bytes)
    pub output_size: u64,
    pub provenance: CredentialProvenance,
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(
        organization_id: OrganizationId,
        action: impl Into<String>,
        provenance: CredentialProvenance,
    ) -> Self {
        Self {
            id: UsageEventId::generate(),
            organization_id,
            club_id: None,
            user_id: None,
            action: action.into(),
            outcome: UsageOutcome::Success,
            input_size: 0,
            output_size: 0,
            provenance,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_club(mut self, club_id: Option<ClubId>) -> Self {
        self.club_id = club_id;
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_sizes(mut self, input_size: u64, output_size: u64) -> Self {
        self.input_size = input_size;
        self.output_size = output_size;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &UsageEventId {
        &self.id
    }
}
