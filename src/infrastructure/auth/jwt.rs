//! Session token validation for gateway callers

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::tenant::OrganizationId;
use crate::domain::DomainError;

/// Claims carried by a caller's session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Organization the session is scoped to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(user_id: impl Into<String>, org: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.into(),
            org,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Reject a session scoped to a different organization than the request
    pub fn ensure_organization(&self, organization_id: &OrganizationId) -> Result<(), DomainError> {
        match self.org.as_deref() {
            Some(org) if org != organization_id.as_str() => Err(DomainError::validation(format!(
                "Session is not valid for organization '{}'",
                organization_id
            ))),
            _ => Ok(()),
        }
    }
}

/// HS256 session token service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str) -> Result<Self, DomainError> {
        if secret.is_empty() {
            return Err(DomainError::configuration("Session secret cannot be empty"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Sign claims into a token
    pub fn issue(&self, claims: &SessionClaims) -> Result<String, DomainError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to sign session token: {}", e)))
    }

    /// Validate signature and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<SessionClaims, DomainError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::validation(format!("Invalid session token: {}", e)))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let service = JwtService::new("test-secret").unwrap();
        let claims = SessionClaims::new("user-1", Some("org-1".to_string()), Duration::hours(1));

        let token = service.issue(&claims).unwrap();
        let validated = service.validate(&token).unwrap();

        assert_eq!(validated.user_id(), "user-1");
        assert_eq!(validated.org.as_deref(), Some("org-1"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new("secret-a").unwrap();
        let verifier = JwtService::new("secret-b").unwrap();
        let token = issuer
            .issue(&SessionClaims::new("user-1", None, Duration::hours(1)))
            .unwrap();

        assert!(verifier.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new("test-secret").unwrap();
        let token = service
            .issue(&SessionClaims::new("user-1", None, Duration::hours(-2)))
            .unwrap();

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_organization_claim_must_match() {
        let org = OrganizationId::new("org-1").unwrap();
        let other = OrganizationId::new("org-2").unwrap();
        let scoped = SessionClaims::new("user-1", Some("org-1".to_string()), Duration::hours(1));
        let unscoped = SessionClaims::new("user-1", None, Duration::hours(1));

        assert!(scoped.ensure_organization(&org).is_ok());
        assert!(scoped.ensure_organization(&other).is_err());
        assert!(unscoped.ensure_organization(&other).is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(JwtService::new("").is_err());
    }
}
