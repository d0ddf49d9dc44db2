//! API middleware and extractors

pub mod admin;
pub mod caller;
pub mod logging;
pub mod metrics;
pub mod origin;
pub mod security;

pub use admin::{RequireAdmin, ADMIN_TOKEN_HEADER};
pub use caller::Caller;
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use origin::origin_headers_middleware;
pub use security::{security_headers_middleware, MAX_BODY_SIZE};
