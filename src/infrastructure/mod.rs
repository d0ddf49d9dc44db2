//! Infrastructure layer - Vault, stores, limiter, gateway and upstream client

pub mod auth;
pub mod credentials;
pub mod gateway;
pub mod generation;
pub mod logging;
pub mod observability;
pub mod rate_limit;
pub mod tenant;
pub mod usage;
pub mod vault;
