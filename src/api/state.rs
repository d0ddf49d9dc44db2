//! Application state shared by handlers

use std::sync::Arc;

use crate::domain::credentials::SecretValue;
use crate::infrastructure::auth::JwtService;
use crate::infrastructure::gateway::GatewayService;
use crate::infrastructure::observability::PrometheusMetrics;
use crate::infrastructure::tenant::SettingsService;

/// Environment variable holding the admin API token
pub const ADMIN_TOKEN_ENV: &str = "GATEWAY_ADMIN_TOKEN";

#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: GatewayService,
    pub settings: SettingsService,
    /// Session token validator; callers are anonymous-only when absent
    pub jwt: Option<Arc<JwtService>>,
    /// Admin API is disabled when absent
    pub admin_token: Option<Arc<SecretValue>>,
    pub metrics: Option<PrometheusMetrics>,
}

impl AppState {
    pub fn new(gateway: GatewayService, settings: SettingsService) -> Self {
        Self {
            gateway,
            settings,
            jwt: None,
            admin_token: None,
            metrics: None,
        }
    }

    pub fn with_jwt(mut self, jwt: JwtService) -> Self {
        self.jwt = Some(Arc::new(jwt));
        self
    }

    pub fn with_admin_token(mut self, token: SecretValue) -> Self {
        self.admin_token = Some(Arc::new(token)).filter(|t| !t.is_empty());
        self
    }

    pub fn with_metrics(mut self, metrics: Option<PrometheusMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Read the admin token from the environment; absent or blank yields `None`
    pub fn admin_token_from_env() -> Option<SecretValue> {
        std::env::var(ADMIN_TOKEN_ENV)
            .ok()
            .map(|token| SecretValue::new(token.trim()))
            .filter(|token| !token.is_empty())
    }
}
