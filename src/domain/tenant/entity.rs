//! Organization and club AI settings entities

use serde::{Deserialize, Serialize};

use crate::domain::credentials::EncryptedSecret;
use crate::domain::DomainError;

const MAX_ID_LENGTH: usize = 64;

fn validate_scope_id(kind: &str, id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::validation(format!("{} ID cannot be empty", kind)));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(DomainError::validation(format!(
            "{} ID cannot exceed {} characters",
            kind, MAX_ID_LENGTH
        )));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::validation(format!(
            "{} ID can only contain alphanumeric characters, hyphens, and underscores",
            kind
        )));
    }

    Ok(())
}

/// Identifier of an organization (the tenant)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_scope_id("Organization", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrganizationId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrganizationId> for String {
    fn from(id: OrganizationId) -> Self {
        id.0
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a club (the sub-tenant)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClubId(String);

impl ClubId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_scope_id("Club", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClubId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClubId> for String {
    fn from(id: ClubId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ClubId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an organization sources its AI credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationAiMode {
    /// Platform credential only
    #[default]
    Managed,
    /// Organization credential
    Byok,
    /// Organization credential when configured, platform credential otherwise
    Hybrid,
}

impl OrganizationAiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Managed => "managed",
            Self::Byok => "byok",
            Self::Hybrid => "hybrid",
        }
    }

    /// Whether a stored organization credential takes precedence in this mode
    pub fn allows_override(&self) -> bool {
        matches!(self, Self::Byok | Self::Hybrid)
    }
}

impl std::str::FromStr for OrganizationAiMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "managed" => Ok(Self::Managed),
            "byok" => Ok(Self::Byok),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(DomainError::validation(format!(
                "Unknown organization AI mode '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for OrganizationAiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a club sources its AI credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubAiMode {
    /// Use whatever the parent organization resolves to
    #[default]
    Inherit,
    /// Club credential
    Byok,
}

impl ClubAiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inherit => "inherit",
            Self::Byok => "byok",
        }
    }

    pub fn allows_override(&self) -> bool {
        matches!(self, Self::Byok)
    }
}

impl std::str::FromStr for ClubAiMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inherit" => Ok(Self::Inherit),
            "byok" => Ok(Self::Byok),
            other => Err(DomainError::validation(format!(
                "Unknown club AI mode '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ClubAiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential column pair of a settings row
///
/// Row absence is modelled by the repository returning `None`; a present row
/// is either empty or sealed. A row holding only half of the pair is rejected
/// by [`CredentialSlot::from_columns`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CredentialSlot {
    #[default]
    Empty,
    Sealed(EncryptedSecret),
}

impl CredentialSlot {
    /// Build a slot from the raw ciphertext and iv columns
    pub fn from_columns(
        ciphertext: Option<String>,
        iv: Option<String>,
    ) -> Result<Self, DomainError> {
        match (ciphertext, iv) {
            (None, None) => Ok(Self::Empty),
            (Some(ciphertext), Some(iv)) => Ok(Self::Sealed(EncryptedSecret::new(ciphertext, iv))),
            _ => Err(DomainError::storage(
                "Stored credential is incomplete: ciphertext and iv must be set together",
            )),
        }
    }

    pub fn sealed(&self) -> Option<&EncryptedSecret> {
        match self {
            Self::Empty => None,
            Self::Sealed(secret) => Some(secret),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Sealed(_))
    }
}

/// Organization-level AI settings row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationAiSettings {
    organization_id: OrganizationId,
    mode: OrganizationAiMode,
    credential: CredentialSlot,
}

impl OrganizationAiSettings {
    pub fn new(organization_id: OrganizationId, mode: OrganizationAiMode) -> Self {
        Self {
            organization_id,
            mode,
            credential: CredentialSlot::Empty,
        }
    }

    pub fn with_credential(mut self, credential: CredentialSlot) -> Self {
        self.credential = credential;
        self
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn mode(&self) -> OrganizationAiMode {
        self.mode
    }

    pub fn credential(&self) -> &CredentialSlot {
        &self.credential
    }

    /// Sealed credential that should override the platform default, if any
    pub fn override_credential(&self) -> Option<&EncryptedSecret> {
        if self.mode.allows_override() {
            self.credential.sealed()
        } else {
            None
        }
    }

    pub fn set_mode(&mut self, mode: OrganizationAiMode) {
        self.mode = mode;
    }

    pub fn set_credential(&mut self, credential: CredentialSlot) {
        self.credential = credential;
    }
}

/// Club-level AI settings row, carrying the immutable parent link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubAiSettings {
    club_id: ClubId,
    organization_id: OrganizationId,
    mode: ClubAiMode,
    credential: CredentialSlot,
}

impl ClubAiSettings {
    pub fn new(club_id: ClubId, organization_id: OrganizationId, mode: ClubAiMode) -> Self {
        Self {
            club_id,
            organization_id,
            mode,
            credential: CredentialSlot::Empty,
        }
    }

    pub fn with_credential(mut self, credential: CredentialSlot) -> Self {
        self.credential = credential;
        self
    }

    pub fn club_id(&self) -> &ClubId {
        &self.club_id
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn mode(&self) -> ClubAiMode {
        self.mode
    }

    pub fn credential(&self) -> &CredentialSlot {
        &self.credential
    }

    pub fn belongs_to(&self, organization_id: &OrganizationId) -> bool {
        &self.organization_id == organization_id
    }

    /// Reject a club referenced under the wrong organization
    pub fn ensure_belongs_to(&self, organization_id: &OrganizationId) -> Result<(), DomainError> {
        if self.belongs_to(organization_id) {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "Club '{}' does not belong to organization '{}'",
                self.club_id, organization_id
            )))
        }
    }

    pub fn override_credential(&self) -> Option<&EncryptedSecret> {
        if self.mode.allows_override() {
            self.credential.sealed()
        } else {
            None
        }
    }

    pub fn set_mode(&mut self, mode: ClubAiMode) {
        self.mode = mode;
    }

    pub fn set_credential(&mut self, credential: CredentialSlot) {
        self.credential = credential;
    }
}
