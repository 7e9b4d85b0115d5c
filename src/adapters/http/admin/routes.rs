//! Axum router configuration for the admin dashboard.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::adapters::http::middleware::{rate_limit_middleware, require_admin};
use crate::adapters::http::state::AppState;

use super::handlers::{analytics, delete_lead, diagnostic, login};

/// Create the admin router.
///
/// # Routes
///
/// ## Public (rate limited)
/// - `POST /admin/login` - Session token for an admin
///
/// ## Protected (admin session or dashboard token)
/// - `GET /admin/analytics` - Funnel overview
/// - `DELETE /admin/leads/delete` - Delete a lead
/// - `GET /admin/diagnostic` - Configured integrations
pub fn admin_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/admin/analytics", get(analytics))
        .route("/admin/leads/delete", delete(delete_lead))
        .route("/admin/diagnostic", get(diagnostic))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/admin/login", post(login))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware))
        .merge(protected)
}
