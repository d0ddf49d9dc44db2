//! PostgreSQL usage log
//!
//! Appends to the externally owned `ai_usage_events` table.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::usage::{UsageEvent, UsageLog};
use crate::domain::DomainError;

/// PostgreSQL implementation of UsageLog
#[derive(Debug, Clone)]
pub struct PostgresUsageLog {
    pool: PgPool,
}

impl PostgresUsageLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageLog for PostgresUsageLog {
    async fn append(&self, event: UsageEvent) -> Result<(), DomainError> {
        let metadata = serde_json::to_value(&event.metadata)
            .map_err(|e| DomainError::internal(format!("Failed to serialize metadata: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO ai_usage_events
                (id, organization_id, club_id, user_id, action, outcome,
                 input_size, output_size, credential_source, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(event.id().as_str())
        .bind(event.organization_id.as_str())
        .bind(event.club_id.as_ref().map(|c| c.as_str()))
        .bind(event.user_id.as_deref())
        .bind(&event.action)
        .bind(event.outcome.as_str())
        .bind(event.input_size as i64)
        .bind(event.output_size as i64)
        .bind(event.provenance.as_str())
        .bind(metadata)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to append usage event: {}", e)))?;

        Ok(())
    }
}
