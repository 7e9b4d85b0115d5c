//! Axum router configuration for campaign endpoints.

use axum::{routing::post, Router};

use crate::adapters::http::state::AppState;

use super::handlers::ai_generate;

/// # Routes
/// - `POST /campaigns/:id/ai-generate` - Draft a message; the license key travels in the body
pub fn campaign_routes() -> Router<AppState> {
    Router::new().route("/campaigns/:id/ai-generate", post(ai_generate))
}
