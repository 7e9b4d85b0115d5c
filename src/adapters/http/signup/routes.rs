//! Axum router configuration for signup.

use axum::{middleware, routing::post, Router};

use crate::adapters::http::middleware::rate_limit_middleware;
use crate::adapters::http::state::AppState;

use super::handlers::create_user;

/// # Routes
/// - `POST /users/create` - Direct signup (rate limited)
pub fn signup_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/create", post(create_user))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}
