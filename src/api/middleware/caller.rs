//! Caller identity and network origin extraction

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::types::ApiError;
use crate::infrastructure::auth::{JwtService, SessionClaims};
use crate::infrastructure::gateway::CallerContext;

/// Authorization header as presented, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bearer {
    Absent,
    Token(String),
    /// Present but unusable, with the reason reported on authentication
    Malformed(&'static str),
}

impl Bearer {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Self::Absent;
        };

        let Ok(value) = value.to_str() else {
            return Self::Malformed("Invalid Authorization header encoding");
        };

        match value.strip_prefix("Bearer ").map(str::trim) {
            Some(token) if !token.is_empty() => Self::Token(token.to_string()),
            Some(_) => Self::Malformed("Bearer token is empty"),
            None => Self::Malformed("Authorization header must use the Bearer scheme"),
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

/// Who is calling and from where
///
/// Extraction never fails. The bearer token is only validated by
/// [`Caller::authenticate`], after the caller-scoped limit has been taken.
#[derive(Debug, Clone)]
pub struct Caller {
    pub bearer: Bearer,
    pub network_origin: String,
    pub origin: Option<String>,
}

impl Caller {
    /// Context for admission, before the session is known
    pub fn context(&self) -> CallerContext {
        CallerContext {
            user_id: None,
            presents_session: self.bearer.is_present(),
            network_origin: self.network_origin.clone(),
            origin: self.origin.clone(),
        }
    }

    /// Validate the presented token; an absent token is an anonymous caller
    pub fn authenticate(&self, jwt: Option<&JwtService>) -> Result<Option<SessionClaims>, ApiError> {
        let token = match &self.bearer {
            Bearer::Absent => return Ok(None),
            Bearer::Malformed(reason) => return Err(ApiError::unauthorized(*reason)),
            Bearer::Token(token) => token,
        };

        let jwt = jwt.ok_or_else(|| {
            ApiError::unauthorized("Session tokens are not accepted by this gateway")
        })?;
        let claims = jwt
            .validate(token)
            .map_err(|e| ApiError::unauthorized(e.to_string()))?;
        debug!(user_id = %claims.user_id(), "Authenticated caller");

        Ok(Some(claims))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Caller {
            bearer: Bearer::from_headers(&parts.headers),
            network_origin: network_origin(&parts.headers, peer),
            origin: header_str(&parts.headers, header::ORIGIN.as_str()).map(str::to_string),
        })
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer
pub fn network_origin(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .or_else(|| header_str(headers, "x-real-ip").map(str::trim).filter(|ip| !ip.is_empty()))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
