//! In-memory usage log

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::usage::{UsageEvent, UsageLog};
use crate::domain::DomainError;

/// Bounded in-memory usage log; the oldest events are dropped past capacity
#[derive(Debug)]
pub struct InMemoryUsageLog {
    events: RwLock<VecDeque<UsageEvent>>,
    max_events: usize,
}

impl InMemoryUsageLog {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            max_events,
        }
    }

    /// Snapshot of the retained events, oldest first
    pub fn events(&self) -> Vec<UsageEvent> {
        self.events
            .read()
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryUsageLog {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl UsageLog for InMemoryUsageLog {
    async fn append(&self, event: UsageEvent) -> Result<(), DomainError> {
        let mut events = self.events.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        events.push_back(event);
        while events.len() > self.max_events {
            events.pop_front();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::CredentialProvenance;
    use crate::domain::tenant::OrganizationId;

    fn event(action: &str) -> UsageEvent {
        UsageEvent::new(
            OrganizationId::new("org-1").unwrap(),
            action,
            CredentialProvenance::PlatformDefault,
        )
    }

    #[tokio::test]
    async fn test_append_evicts_oldest() {
        let log = InMemoryUsageLog::new(2);

        log.append(event("a")).await.unwrap();
        log.append(event("b")).await.unwrap();
        log.append(event("c")).await.unwrap();

        let actions: Vec<String> = log.events().into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["b", "c"]);
    }
}
