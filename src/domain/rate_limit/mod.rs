//! Rate limiting domain: policies, decisions and the store seam

mod decision;
mod policy;

pub use decision::{LimitScope, RateLimitDecision};
pub use policy::RateLimitPolicy;

use async_trait::async_trait;
use std::fmt::Debug;

/// Admission-control state keyed by an opaque identity string
///
/// Implementations must make the read-compare-increment sequence for one key
/// atomic with respect to concurrent checks of the same key.
#[async_trait]
pub trait RateLimitStore: Send + Sync + Debug {
    /// Count one request against `key` and decide whether it is admitted
    async fn check(&self, key: &str, window_ms: u64, max_requests: u32) -> RateLimitDecision;
}
