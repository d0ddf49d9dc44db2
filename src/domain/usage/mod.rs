//! Usage accounting domain

mod record;
mod repository;

pub use record::{UsageEvent, UsageEventId, UsageOutcome};
pub use repository::UsageLog;
