//! Usage log trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::UsageEvent;
use crate::domain::DomainError;

/// Write-only, append-only store of usage events
#[async_trait]
pub trait UsageLog: Send + Sync + Debug {
    /// Append one event
    async fn append(&self, event: UsageEvent) -> Result<(), DomainError>;
}
