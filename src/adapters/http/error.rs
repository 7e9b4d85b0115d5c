//! Error responses shared by every endpoint.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidLicense / NoSubscription / SubscriptionInactive / InvalidCredentials | 401 |
//! | UpgradeRequired | 403 |
//! | ClinicNotFound / LeadNotFound | 404 |
//! | EmailAlreadyRegistered / InvalidState | 409 |
//! | ValidationFailed / InvalidPlan / UnknownPaymentAmount / MissingCredentials | 400 |
//! | UsageLimitReached | 429 |
//! | Upstream | 502 |
//! | Unavailable | 503 |
//! | Infrastructure | 500 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::domain::admin::AdminError;
use crate::domain::funnel::FunnelError;
use crate::domain::subscription::SubscriptionError;

/// Standard error body: `{ "error": "...", "code": "..." }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        error: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: Some(details),
        }
    }
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Subscription(SubscriptionError),
    Funnel(FunnelError),
    Admin(AdminError),
}

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        ApiError::Subscription(err)
    }
}

impl From<FunnelError> for ApiError {
    fn from(err: FunnelError) -> Self {
        ApiError::Funnel(err)
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        ApiError::Admin(err)
    }
}

pub fn subscription_status(err: &SubscriptionError) -> StatusCode {
    match err {
        SubscriptionError::InvalidLicense
        | SubscriptionError::NoSubscription
        | SubscriptionError::SubscriptionInactive(_)
        | SubscriptionError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        SubscriptionError::ClinicNotFound => StatusCode::NOT_FOUND,
        SubscriptionError::EmailAlreadyRegistered | SubscriptionError::InvalidState(_) => {
            StatusCode::CONFLICT
        }
        SubscriptionError::InvalidPlan(_)
        | SubscriptionError::UnknownPaymentAmount(_)
        | SubscriptionError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        SubscriptionError::UpgradeRequired(_) => StatusCode::FORBIDDEN,
        SubscriptionError::UsageLimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
        SubscriptionError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SubscriptionError::Upstream(_) => StatusCode::BAD_GATEWAY,
        SubscriptionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn funnel_status(err: &FunnelError) -> StatusCode {
    match err {
        FunnelError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        FunnelError::LeadNotFound => StatusCode::NOT_FOUND,
        FunnelError::Unauthorized => StatusCode::UNAUTHORIZED,
        FunnelError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn admin_status(err: &AdminError) -> StatusCode {
    match err {
        AdminError::MissingCredentials => StatusCode::BAD_REQUEST,
        AdminError::InvalidCredentials | AdminError::Unauthorized => StatusCode::UNAUTHORIZED,
        AdminError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Subscription(err) => {
                let status = subscription_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                let code = err.code().to_string();
                let body = match &err {
                    SubscriptionError::UpgradeRequired(_) => json!({
                        "error": err.message(),
                        "code": code,
                        "upgradeRequired": true,
                    }),
                    SubscriptionError::UsageLimitReached { used, limit } => json!({
                        "error": err.message(),
                        "code": code,
                        "usageToday": used,
                        "dailyLimit": limit,
                    }),
                    _ => json!(ErrorResponse::new(code, err.message())),
                };
                (status, Json(body)).into_response()
            }
            ApiError::Funnel(err) => {
                let status = funnel_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                let body = ErrorResponse::new(err.code().to_string(), err.message());
                (status, Json(body)).into_response()
            }
            ApiError::Admin(err) => {
                let status = admin_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "admin request failed");
                }
                let body = ErrorResponse::new(err.code().to_string(), err.message());
                (status, Json(body)).into_response()
            }
        }
    }
}

/// License verification failure: `{ "valid": false, "error": "...", "status"? }`.
#[derive(Debug)]
pub struct VerificationError(pub SubscriptionError);

impl From<SubscriptionError> for VerificationError {
    fn from(err: SubscriptionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for VerificationError {
    fn into_response(self) -> Response {
        let status = subscription_status(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "license verification failed");
        }
        let body = match &self.0 {
            SubscriptionError::SubscriptionInactive(sub_status) => json!({
                "valid": false,
                "error": self.0.message(),
                "status": sub_status,
            }),
            _ => json!({ "valid": false, "error": self.0.message() }),
        };
        (status, Json(body)).into_response()
    }
}
