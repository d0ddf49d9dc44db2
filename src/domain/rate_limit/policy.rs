use serde::Deserialize;

/// A named limiter configuration
///
/// The name becomes the key prefix so that several policies can share one
/// physical store without their identities colliding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimitPolicy {
    pub name: String,
    pub window_ms: u64,
    pub max_requests: u32,
}

impl RateLimitPolicy {
    pub fn new(name: impl Into<String>, window_ms: u64, max_requests: u32) -> Self {
        Self {
            name: name.into(),
            window_ms,
            max_requests,
        }
    }

    /// Per-caller default: 10 generations per minute
    pub fn caller_default() -> Self {
        Self::new("caller", 60_000, 10)
    }

    /// Per-organization default: 60 generations per minute
    pub fn tenant_default() -> Self {
        Self::new("tenant", 60_000, 60)
    }

    /// Store key for an identity under this policy
    pub fn key_for(&self, identity: &str) -> String {
        format!("{}:{}", self.name, identity)
    }
}
