//! Rate limiting infrastructure implementations

mod in_memory;
mod limiter;

pub use in_memory::{InMemoryRateLimitStore, DEFAULT_MAX_ENTRIES, DEFAULT_SWEEP_INTERVAL};
pub use limiter::RateLimiter;
