//! HTTP handlers for the admin dashboard.

use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::extract::ApiJson;
use crate::adapters::http::middleware::RequireAdmin;
use crate::adapters::http::state::AppState;
use crate::application::handlers::admin::{
    AdminLoginCommand, DeleteLeadCommand, GetDashboardQuery,
};
use crate::domain::foundation::Timestamp;

use super::dto::{
    AdminLoginRequest, AdminLoginResponse, AnalyticsParams, DeleteLeadParams, DeleteLeadResponse,
    DiagnosticResponse,
};

/// POST /api/admin/login - Exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdminLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.admin_login_handler();
    let cmd = AdminLoginCommand {
        email: request.email,
        password: request.password,
    };

    let result = handler.handle(cmd).await?;

    tracing::info!(admin_id = %result.admin.id, "admin logged in");

    Ok(Json(AdminLoginResponse::from(result)))
}

/// GET /api/admin/analytics?period=N - Funnel overview for the last N days
pub async fn analytics(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    Query(params): Query<AnalyticsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.dashboard_handler();
    let query = GetDashboardQuery {
        period: params.period,
    };

    let overview = handler.handle(query).await?;

    tracing::debug!(admin = %principal.label(), period_days = overview.period_days, "dashboard served");

    Ok(Json(overview))
}

/// DELETE /api/admin/leads/delete?id= - Remove a lead
pub async fn delete_lead(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    Query(params): Query<DeleteLeadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.delete_lead_handler();
    let cmd = DeleteLeadCommand { id: params.id };

    handler.handle(cmd).await?;

    tracing::info!(admin = %principal.label(), "lead deleted");

    Ok(Json(DeleteLeadResponse { success: true }))
}

/// GET /api/admin/diagnostic - Which integrations this instance is configured with
pub async fn diagnostic(State(state): State<AppState>, _admin: RequireAdmin) -> impl IntoResponse {
    Json(DiagnosticResponse::new(
        state.config_report.as_ref().clone(),
        Timestamp::now(),
    ))
}
