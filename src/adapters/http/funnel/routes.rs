//! Axum router configuration for funnel endpoints.

use axum::{routing::post, Router};

use crate::adapters::http::state::AppState;

use super::handlers::{forward_conversion, track_event};

/// # Routes
/// - `POST /analytics/track` - Funnel event from the landing site
/// - `POST /facebook/capi` - Conversions API relay
pub fn funnel_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/track", post(track_event))
        .route("/facebook/capi", post(forward_conversion))
}
