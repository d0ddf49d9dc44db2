//! Caller authentication

mod jwt;

pub use jwt::{JwtService, SessionClaims};
