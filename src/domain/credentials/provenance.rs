//! Credential provenance

use serde::{Deserialize, Serialize};

use super::SecretValue;

/// Which tier of the precedence chain supplied a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialProvenance {
    ClubOverride,
    OrgOverride,
    PlatformDefault,
}

impl CredentialProvenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClubOverride => "club_override",
            Self::OrgOverride => "org_override",
            Self::PlatformDefault => "platform_default",
        }
    }
}

impl std::fmt::Display for CredentialProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decrypted credential together with where it came from
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub api_key: SecretValue,
    pub provenance: CredentialProvenance,
}

impl ResolvedCredential {
    pub fn new(api_key: SecretValue, provenance: CredentialProvenance) -> Self {
        Self {
            api_key,
            provenance,
        }
    }
}
