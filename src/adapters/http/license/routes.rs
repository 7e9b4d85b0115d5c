//! Axum router configuration for license endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{rate_limit_middleware, require_service_token};
use crate::adapters::http::state::AppState;

use super::handlers::{
    get_clinic_by_email, manage_subscription, record_usage, resend_license, verify_license,
};

/// Create the license API router.
///
/// # Routes
///
/// ## Desktop Client (Bearer service token)
/// - `POST /auth/verify-license` - Verify a license key
/// - `POST /usage/record` - Record usage for a license key
///
/// ## Account Endpoints
/// - `POST /auth/resend-license` - Email the license key (rate limited)
/// - `POST /auth/manage-subscription` - Subscription info or downgrade
/// - `GET /clinics/get-by-email` - Public clinic fields for an email
pub fn license_routes(state: AppState) -> Router<AppState> {
    let desktop = Router::new()
        .route("/auth/verify-license", post(verify_license))
        .route("/usage/record", post(record_usage))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_service_token,
        ));

    let limited = Router::new()
        .route("/auth/resend-license", post(resend_license))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware));

    Router::new()
        .route("/auth/manage-subscription", post(manage_subscription))
        .route("/clinics/get-by-email", get(get_clinic_by_email))
        .merge(desktop)
        .merge(limited)
}
