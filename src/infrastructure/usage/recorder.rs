//! Best-effort usage recording

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::usage::{UsageEvent, UsageLog};

/// Appends usage events without ever failing the caller
///
/// Storage errors are logged and dropped so that accounting availability
/// never gates the request path.
#[derive(Debug, Clone)]
pub struct UsageRecorder {
    log: Arc<dyn UsageLog>,
}

impl UsageRecorder {
    pub fn new(log: Arc<dyn UsageLog>) -> Self {
        Self { log }
    }

    pub async fn record(&self, event: UsageEvent) {
        let event_id = event.id().clone();
        let organization_id = event.organization_id.clone();

        match self.log.append(event).await {
            Ok(()) => debug!(event_id = %event_id, "Usage event recorded"),
            Err(e) => warn!(
                event_id = %event_id,
                organization_id = %organization_id,
                error = %e,
                "Failed to record usage event, discarding"
            ),
        }
    }
}
