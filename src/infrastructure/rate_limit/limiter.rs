//! Policy-aware rate limiter over a shared store

use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use super::InMemoryRateLimitStore;
use crate::domain::rate_limit::{LimitScope, RateLimitDecision, RateLimitPolicy, RateLimitStore};

/// Applies named policies against one physical store
///
/// Each policy prefixes its keys with its name, so the caller layer and the
/// tenant layer can share a store without colliding.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Limiter backed by a fresh in-process store
    pub fn in_memory(sweep_interval: u64, max_entries: usize) -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::with_limits(
            sweep_interval,
            max_entries,
        )))
    }

    /// Count one request for `identity` under `policy`
    pub async fn check(
        &self,
        scope: LimitScope,
        policy: &RateLimitPolicy,
        identity: &str,
    ) -> RateLimitDecision {
        let decision = self
            .store
            .check(&policy.key_for(identity), policy.window_ms, policy.max_requests)
            .await;

        if !decision.allowed {
            counter!("gateway_rate_limited_total", "scope" => scope.as_str()).increment(1);
            debug!(
                scope = %scope,
                policy = %policy.name,
                retry_after_secs = ?decision.retry_after_secs,
                "Rate limit exceeded"
            );
        }

        decision
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()))
    }
}
