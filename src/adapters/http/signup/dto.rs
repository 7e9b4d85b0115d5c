//! HTTP DTOs for direct signup.
//!
//! The landing site posts camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::application::handlers::signup::{RegisterClinicCommand, RegisterClinicResult};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub clinic_name: Option<String>,
    /// `FREE`, `PRO` or `PREMIUM`.
    #[serde(default)]
    pub selected_plan: String,
    #[serde(default)]
    pub billing_cycle: Option<String>,
}

impl From<CreateUserRequest> for RegisterClinicCommand {
    fn from(request: CreateUserRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            phone: request.phone,
            clinic_name: request.clinic_name,
            selected_plan: request.selected_plan,
            billing_cycle: request.billing_cycle,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub success: bool,
    pub user_id: String,
    pub license_key: String,
    /// Checkout URL for paid plans; `null` for FREE.
    pub payment_url: Option<String>,
}

impl From<RegisterClinicResult> for CreateUserResponse {
    fn from(result: RegisterClinicResult) -> Self {
        Self {
            success: true,
            user_id: result.clinic.id.to_string(),
            license_key: result.clinic.license_key.to_string(),
            payment_url: result.payment_url,
        }
    }
}
