//! Top-level router: every area under `/api`, the shared middleware stack,
//! and the health probe outside the request timeout.

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;

use super::admin::admin_routes;
use super::campaigns::campaign_routes;
use super::funnel::funnel_routes;
use super::license::license_routes;
use super::signup::signup_routes;
use super::state::AppState;
use super::webhooks::webhook_routes;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health - Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Every `/api` route, with per-route auth and rate limiting attached.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(license_routes(state.clone()))
        .merge(signup_routes(state.clone()))
        .merge(admin_routes(state))
        .merge(webhook_routes())
        .merge(campaign_routes())
        .merge(funnel_routes())
}

/// Build the complete application router.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    // Order matters - outermost first
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(server))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(server.request_timeout()));

    let health_routes = Router::new().route("/health", get(health));

    Router::new()
        .nest("/api", api_routes(state.clone()))
        .layer(middleware)
        .merge(health_routes)
        .with_state(state)
}

/// Any origin unless specific ones are configured.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if server.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = server
        .allowed_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}
