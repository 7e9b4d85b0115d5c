//! HTTP handler for direct signup.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::extract::ApiJson;
use crate::adapters::http::state::AppState;
use crate::application::handlers::signup::RegisterClinicCommand;

use super::dto::{CreateUserRequest, CreateUserResponse};

/// POST /api/users/create - Register a clinic with the selected plan
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.register_clinic_handler();
    let cmd = RegisterClinicCommand::from(request);

    let result = handler.handle(cmd).await?;

    tracing::info!(
        clinic_id = %result.clinic.id,
        tier = %result.subscription.tier,
        status = %result.subscription.status,
        "clinic registered"
    );

    Ok((StatusCode::OK, Json(CreateUserResponse::from(result))))
}
