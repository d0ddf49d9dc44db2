//! Usage recording infrastructure implementations

mod in_memory;
mod postgres_repository;
mod recorder;

pub use in_memory::InMemoryUsageLog;
pub use postgres_repository::PostgresUsageLog;
pub use recorder::UsageRecorder;
