//! Authentication middleware and extractors for axum.
//!
//! This module provides:
//! - `require_service_token` - Desktop client endpoints guarded by the shared bearer token
//! - `require_admin` - Dashboard endpoints; accepts an admin session token or the static dashboard token
//! - `RequireAdmin` - Extractor for the admin principal injected by `require_admin`
//!
//! ```text
//! Request → require_admin → injects AdminPrincipal into extensions
//!                                   ↓
//!                           Handler → RequireAdmin extractor reads from extensions
//! ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::ErrorResponse;
use crate::adapters::http::state::AppState;
use crate::domain::foundation::AdminUserId;

/// Who is calling an admin endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminPrincipal {
    /// A logged-in admin holding a session token.
    Session { admin_id: AdminUserId, email: String },
    /// The static dashboard token from configuration.
    DashboardToken,
}

impl AdminPrincipal {
    pub fn label(&self) -> &str {
        match self {
            AdminPrincipal::Session { email, .. } => email,
            AdminPrincipal::DashboardToken => "dashboard-token",
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects requests that do not carry the configured service token.
///
/// The body keeps the `valid: false` shape the desktop client expects from
/// license verification.
pub async fn require_service_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match bearer_token(request.headers()) {
        Some(token) if state.access.is_service_token(token) => next.run(request).await,
        _ => {
            tracing::warn!(path = %request.uri().path(), "rejected request without service token");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "valid": false,
                    "error": "Unauthorized - Invalid or missing Bearer token"
                })),
            )
                .into_response()
        }
    }
}

/// Authenticates dashboard requests.
///
/// The static dashboard token is checked first; anything else must be a
/// valid admin session token. On success the `AdminPrincipal` is injected
/// into request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return AuthRejection::Unauthenticated.into_response();
    };

    let principal = if state.access.is_dashboard_token(token) {
        AdminPrincipal::DashboardToken
    } else {
        match state.integrations.admin_sessions.validate(token) {
            Ok(identity) => AdminPrincipal::Session {
                admin_id: identity.admin_id,
                email: identity.email,
            },
            Err(err) => {
                tracing::debug!(error = %err, "admin token rejected");
                return AuthRejection::Unauthenticated.into_response();
            }
        }
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Extractor that requires an authenticated admin.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AdminPrincipal);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminPrincipal>()
            .cloned()
            .map(RequireAdmin)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Rejection for missing or invalid credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("UNAUTHORIZED", "Unauthorized")),
            )
                .into_response(),
        }
    }
}
