//! Admin endpoints, guarded by the admin token

pub mod settings;

use axum::{routing::put, Router};

use super::state::AppState;

pub fn create_admin_router() -> Router<AppState> {
    Router::new().route("/ai-settings", put(settings::update_ai_settings))
}
