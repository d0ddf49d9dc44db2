//! Fixed-window rate limit store
//!
//! Each key maps to a `(count, window_start)` pair that is restarted once its
//! window has elapsed. O(1) state and work per check; a caller can get up to
//! twice the nominal rate across a window boundary.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::rate_limit::{RateLimitDecision, RateLimitStore};

/// Run a sweep every this many checks
pub const DEFAULT_SWEEP_INTERVAL: u64 = 100;

/// Hard ceiling on tracked keys after a sweep
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    window_start_ms: u64,
    window_ms: u64,
}

impl WindowRecord {
    fn start(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            window_start_ms: now_ms,
            window_ms,
        }
    }

    fn window_end_ms(&self) -> u64 {
        self.window_start_ms.saturating_add(self.window_ms)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    windows: HashMap<String, WindowRecord>,
    checks: u64,
}

/// In-process rate limit store guarded by a single lock
#[derive(Debug)]
pub struct InMemoryRateLimitStore {
    state: Mutex<StoreState>,
    sweep_interval: u64,
    max_entries: usize,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_SWEEP_INTERVAL, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_limits(sweep_interval: u64, max_entries: usize) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            sweep_interval: sweep_interval.max(1),
            max_entries,
        }
    }

    /// Check `key` as of `now_ms` (unix epoch milliseconds)
    pub async fn check_at(
        &self,
        key: &str,
        window_ms: u64,
        max_requests: u32,
        now_ms: u64,
    ) -> RateLimitDecision {
        let mut state = self.state.lock().await;
        state.checks = state.checks.wrapping_add(1);

        // A window keeps the length it started with; a changed length for
        // the same key applies from the next window on.
        let record = match state.windows.get_mut(key) {
            Some(record) if record.window_end_ms() >= now_ms => {
                record.count = record.count.saturating_add(1);
                *record
            }
            _ => {
                let record = WindowRecord::start(now_ms, window_ms);
                state.windows.insert(key.to_string(), record);
                record
            }
        };

        if state.checks % self.sweep_interval == 0 {
            Self::sweep_locked(&mut state, now_ms, self.max_entries);
        }

        decide(&record, max_requests, now_ms)
    }

    /// Drop stale windows, then evict oldest windows beyond the entry cap
    pub async fn sweep_at(&self, now_ms: u64) {
        let mut state = self.state.lock().await;
        Self::sweep_locked(&mut state, now_ms, self.max_entries);
    }

    /// Number of tracked keys
    pub async fn len(&self) -> usize {
        self.state.lock().await.windows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn sweep_locked(state: &mut StoreState, now_ms: u64, max_entries: usize) {
        let before = state.windows.len();

        state
            .windows
            .retain(|_, record| record.window_end_ms().saturating_add(record.window_ms) >= now_ms);

        if state.windows.len() > max_entries {
            let mut by_age: Vec<(String, u64)> = state
                .windows
                .iter()
                .map(|(key, record)| (key.clone(), record.window_start_ms))
                .collect();
            by_age.sort_by_key(|(_, start)| *start);

            let excess = state.windows.len() - max_entries;
            for (key, _) in by_age.into_iter().take(excess) {
                state.windows.remove(&key);
            }
        }

        let removed = before - state.windows.len();
        if removed > 0 {
            debug!(removed, remaining = state.windows.len(), "Swept rate limit windows");
        }
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn check(&self, key: &str, window_ms: u64, max_requests: u32) -> RateLimitDecision {
        self.check_at(key, window_ms, max_requests, now_ms()).await
    }
}

fn decide(record: &WindowRecord, max_requests: u32, now_ms: u64) -> RateLimitDecision {
    let reset_at_ms = record.window_end_ms();

    if record.count > max_requests {
        let wait_ms = reset_at_ms.saturating_sub(now_ms);
        return RateLimitDecision {
            allowed: false,
            limit: max_requests,
            remaining: 0,
            reset_at_ms,
            retry_after_secs: Some(wait_ms.div_ceil(1000).max(1)),
        };
    }

    RateLimitDecision {
        allowed: true,
        limit: max_requests,
        remaining: max_requests.saturating_sub(record.count),
        reset_at_ms,
        retry_after_secs: None,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
