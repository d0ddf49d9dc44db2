//! Tenant AI Gateway
//!
//! Multi-tenant front door for generative AI calls:
//! - Club, organization and platform credential precedence
//! - AES-256-GCM sealed API keys at rest
//! - Caller and tenant rate limiting with bounded memory
//! - Best-effort usage recording

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::tenant::SettingsRepository;
use domain::usage::UsageLog;
use infrastructure::{
    auth::JwtService,
    credentials::CredentialResolver,
    gateway::{GatewayService, ModelDefaults, OriginPolicy},
    generation::{GeminiProvider, HttpClient},
    observability::PrometheusMetrics,
    rate_limit::RateLimiter,
    tenant::{InMemorySettingsRepository, PostgresSettingsRepository, SettingsService},
    usage::{InMemoryUsageLog, PostgresUsageLog, UsageRecorder},
    vault::SecretVault,
};
use tracing::{info, warn};

/// Build the application state from configuration and the process environment
///
/// Fails when the master key is missing or malformed.
pub async fn create_app_state(
    config: &AppConfig,
    metrics: Option<PrometheusMetrics>,
) -> anyhow::Result<AppState> {
    let vault = Arc::new(SecretVault::from_env()?);
    info!("Master key loaded");

    let (settings, usage_log): (Arc<dyn SettingsRepository>, Arc<dyn UsageLog>) =
        match config.database.url {
            Some(ref url) => {
                info!("Connecting to PostgreSQL...");
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .connect(url)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
                info!("PostgreSQL connection established");

                (
                    Arc::new(PostgresSettingsRepository::new(pool.clone())),
                    Arc::new(PostgresUsageLog::new(pool)),
                )
            }
            None => {
                warn!("No database configured, using in-memory settings and usage log");
                (
                    Arc::new(InMemorySettingsRepository::new()),
                    Arc::new(InMemoryUsageLog::default()),
                )
            }
        };

    let platform_key = CredentialResolver::platform_key_from_env();
    if platform_key.is_none() {
        warn!("No platform API key configured; only BYOK tenants can generate");
    }
    let resolver = CredentialResolver::new(settings.clone(), vault.clone(), platform_key);

    let gateway_config = &config.gateway;
    let origins = OriginPolicy::new(
        gateway_config.canonical_origin.clone(),
        gateway_config.allowed_origins.clone(),
        gateway_config.preview_origin_pattern.as_deref(),
    )?;

    let http_client = HttpClient::with_timeout(Duration::from_secs(config.upstream.timeout_secs))?;
    let provider = GeminiProvider::with_base_url(http_client, config.upstream.base_url.clone());

    let gateway = GatewayService::new(
        Arc::new(origins),
        RateLimiter::in_memory(gateway_config.sweep_interval, gateway_config.max_entries),
        gateway_config.caller_limit.clone(),
        gateway_config.tenant_limit.clone(),
        resolver,
        Arc::new(provider),
        UsageRecorder::new(usage_log),
        ModelDefaults {
            text: config.upstream.text_model.clone(),
            image: config.upstream.image_model.clone(),
        },
    );

    let mut state =
        AppState::new(gateway, SettingsService::new(settings, vault)).with_metrics(metrics);

    match config.auth.session_secret {
        Some(ref secret) => state = state.with_jwt(JwtService::new(secret)?),
        None => info!("No session secret configured, all callers are anonymous"),
    }

    match AppState::admin_token_from_env() {
        Some(token) => state = state.with_admin_token(token),
        None => info!("No admin token configured, admin API disabled"),
    }

    Ok(state)
}
