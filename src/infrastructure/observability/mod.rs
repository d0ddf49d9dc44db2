//! Observability infrastructure

mod metrics;

pub use metrics::{init_metrics, record_http_request, PrometheusMetrics};
