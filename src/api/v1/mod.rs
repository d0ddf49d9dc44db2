//! Versioned gateway endpoints

pub mod generate;

use axum::{routing::post, Router};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new().route(
        "/generate",
        post(generate::generate).options(generate::preflight),
    )
}
