//! HTTP handlers for license endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::{ApiError, VerificationError};
use crate::adapters::http::extract::{ApiJson, VerifyJson};
use crate::adapters::http::state::AppState;
use crate::application::handlers::license::{
    GetClinicByEmailQuery, ResendLicenseCommand, VerifyLicenseCommand,
};
use crate::application::handlers::subscription::{
    ManageAction, ManageSubscriptionCommand, ManageSubscriptionResult,
};
use crate::application::handlers::usage::RecordUsageCommand;

use super::dto::{
    ClinicByEmailParams, ClinicLookupResponse, ClinicSummaryResponse, FeaturesResponse,
    LicenseUserResponse, ManageSubscriptionRequest, RecordUsageRequest, RecordUsageResponse,
    ResendLicenseRequest, SubscriptionInfoResponse, SubscriptionResponse, SuccessMessageResponse,
    UsageResponse, VerifyLicenseRequest, VerifyLicenseResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Desktop Client (service token)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/auth/verify-license - Resolve entitlements for a license key
pub async fn verify_license(
    State(state): State<AppState>,
    VerifyJson(request): VerifyJson<VerifyLicenseRequest>,
) -> Result<impl IntoResponse, VerificationError> {
    let handler = state.verify_license_handler();
    let cmd = VerifyLicenseCommand {
        license_key: request.license_key,
    };

    let result = handler.handle(cmd).await?;

    if let Some(change) = &result.applied_change {
        tracing::info!(
            clinic_id = %result.clinic.id,
            from = %change.previous_tier,
            to = %change.tier,
            "scheduled plan change applied during verification"
        );
    }

    let response = VerifyLicenseResponse {
        valid: true,
        user: LicenseUserResponse::from(&result.clinic),
        subscription: SubscriptionResponse::from(&result.subscription),
        features: FeaturesResponse::from(result.features),
        usage: UsageResponse::from(&result.usage),
    };

    Ok(Json(response))
}

/// POST /api/usage/record - Bump a usage counter for a license key
pub async fn record_usage(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RecordUsageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.record_usage_handler();
    let cmd = RecordUsageCommand {
        license_key: request.license_key,
        kind: request.kind,
        amount: request.amount,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(RecordUsageResponse {
        success: true,
        kind: result.kind.to_string(),
        usage: UsageResponse::from(&result.usage),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Account Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/auth/resend-license - Find or create a trial account and email the key
pub async fn resend_license(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResendLicenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.resend_license_handler();
    let cmd = ResendLicenseCommand {
        email: request.email,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(SuccessMessageResponse::new(result.message())))
}

/// POST /api/auth/manage-subscription - Subscription info or a scheduled downgrade
pub async fn manage_subscription(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ManageSubscriptionRequest>,
) -> Result<axum::response::Response, ApiError> {
    let action = ManageAction::parse(
        request.action.as_deref(),
        request.new_tier.as_deref(),
        request.new_billing_cycle.as_deref(),
    )?;

    let handler = state.manage_subscription_handler();
    let cmd = ManageSubscriptionCommand {
        email: request.email,
        license_key: request.license_key,
        action,
    };

    let response = match handler.handle(cmd).await? {
        ManageSubscriptionResult::Info(info) => Json(SubscriptionInfoResponse {
            clinic: ClinicSummaryResponse::from(&info.clinic),
            subscription: info
                .subscription
                .as_ref()
                .map(SubscriptionResponse::from)
                .unwrap_or_else(SubscriptionResponse::free_default),
            links: info.links.into_iter().collect(),
        })
        .into_response(),
        ManageSubscriptionResult::Scheduled { message, .. } => {
            Json(SuccessMessageResponse::new(message)).into_response()
        }
    };

    Ok(response)
}

/// GET /api/clinics/get-by-email?email= - Public clinic fields for an email
pub async fn get_clinic_by_email(
    State(state): State<AppState>,
    Query(params): Query<ClinicByEmailParams>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.get_clinic_by_email_handler();
    let query = GetClinicByEmailQuery {
        email: params.email.unwrap_or_default(),
    };

    let clinic = handler.handle(query).await?;

    Ok(Json(ClinicLookupResponse::from(&clinic)))
}
