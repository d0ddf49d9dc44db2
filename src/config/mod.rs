//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, DatabaseConfig, GatewayConfig, LogFormat, LoggingConfig,
    MetricsConfig, ServerConfig, UpstreamConfig,
};
