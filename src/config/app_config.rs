use serde::Deserialize;

use crate::domain::rate_limit::RateLimitPolicy;
use crate::infrastructure::rate_limit::{DEFAULT_MAX_ENTRIES, DEFAULT_SWEEP_INTERVAL};

/// Application configuration
///
/// Secrets (master key, platform API key, admin token) are read from the
/// environment directly and never appear here.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Origin declared to browsers whose origin is not recognized
    pub canonical_origin: String,
    pub allowed_origins: Vec<String>,
    /// Regex for ephemeral preview deployments, anchored on both ends
    pub preview_origin_pattern: Option<String>,
    pub caller_limit: RateLimitPolicy,
    pub tenant_limit: RateLimitPolicy,
    /// Sweep the limiter store every N checks
    pub sweep_interval: u64,
    /// Hard cap on limiter entries after a sweep
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Postgres URL; in-memory stores are used when absent
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// HS256 secret for caller session tokens; presented tokens are rejected when absent
    pub session_secret: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            canonical_origin: "http://localhost:5173".to_string(),
            allowed_origins: Vec::new(),
            preview_origin_pattern: None,
            caller_limit: RateLimitPolicy::caller_default(),
            tenant_limit: RateLimitPolicy::tenant_default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            timeout_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gateway.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
