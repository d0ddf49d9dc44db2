use serde::Serialize;

/// Which limiter layer produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitScope {
    /// Keyed by caller identity and network origin
    Caller,
    /// Keyed by organization
    Tenant,
}

impl LimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Caller => "caller",
            Self::Tenant => "tenant",
        }
    }
}

impl std::fmt::Display for LimitScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single rate limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Maximum requests per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window ends (unix epoch milliseconds)
    pub reset_at_ms: u64,
    /// Seconds to wait before retrying, set only on denial
    pub retry_after_secs: Option<u64>,
}

impl RateLimitDecision {
    /// Reset time rounded up to whole epoch seconds
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at_ms.div_ceil(1000)
    }

    /// The more restrictive of two admitted decisions
    pub fn tighter(self, other: RateLimitDecision) -> RateLimitDecision {
        if other.remaining < self.remaining {
            other
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(remaining: u32) -> RateLimitDecision {
        RateLimitDecision {
            allowed: true,
            limit: 10,
            remaining,
            reset_at_ms: 1_500,
            retry_after_secs: None,
        }
    }

    #[test]
    fn test_reset_at_secs_rounds_up() {
        assert_eq!(allowed(1).reset_at_secs(), 2);
    }

    #[test]
    fn test_tighter_picks_lowest_remaining() {
        assert_eq!(allowed(5).tighter(allowed(2)).remaining, 2);
        assert_eq!(allowed(1).tighter(allowed(7)).remaining, 1);
    }
}
