//! HTTP DTOs for the desktop client's license endpoints.
//!
//! Field names are snake_case; the desktop client has shipped against this
//! shape and reads it verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::clinic::Clinic;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    BillingCycle, Features, Subscription, SubscriptionStatus, Tier,
};
use crate::domain::usage::UsageSnapshot;

/// Sent as `daily_limit` for tiers without a daily message cap.
pub const UNLIMITED_DAILY_LIMIT: u32 = 999_999;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyLicenseRequest {
    #[serde(default)]
    pub license_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResendLicenseRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManageSubscriptionRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub license_key: String,
    /// `get_info` or `downgrade`.
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub new_tier: Option<String>,
    #[serde(default)]
    pub new_billing_cycle: Option<String>,
}

/// Query string for `GET /api/clinics/get-by-email`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClinicByEmailParams {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordUsageRequest {
    #[serde(default)]
    pub license_key: String,
    /// Counter name: `messages_sent`, `ai_generations` or `campaigns_created`.
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: String,
    #[serde(default)]
    pub amount: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Successful verification. Failures render through `VerificationError`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyLicenseResponse {
    pub valid: bool,
    pub user: LicenseUserResponse,
    pub subscription: SubscriptionResponse,
    pub features: FeaturesResponse,
    pub usage: UsageResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct LicenseUserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub clinic_name: Option<String>,
    pub phone: Option<String>,
    pub doctor_name: Option<String>,
    pub profile_picture_url: Option<String>,
}

impl From<&Clinic> for LicenseUserResponse {
    fn from(clinic: &Clinic) -> Self {
        Self {
            id: clinic.id.to_string(),
            name: clinic.display_name().to_string(),
            email: clinic.email.clone(),
            clinic_name: clinic.clinic_name.clone(),
            phone: clinic.phone.clone(),
            doctor_name: clinic.doctor_name.clone(),
            profile_picture_url: clinic.profile_picture_url.clone(),
        }
    }
}

/// Subscription row as the clients see it. `amount` is in reais.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub tier: Tier,
    pub status: SubscriptionStatus,
    pub billing_cycle: Option<BillingCycle>,
    pub amount: f64,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_billing_cycle: Option<BillingCycle>,
    pub cancel_at_period_end: bool,
}

impl SubscriptionResponse {
    /// Rendered for clinics that never had a subscription row.
    pub fn free_default() -> Self {
        Self {
            tier: Tier::Free,
            status: SubscriptionStatus::Active,
            billing_cycle: None,
            amount: 0.0,
            current_period_start: None,
            current_period_end: None,
            next_tier: None,
            next_billing_cycle: None,
            cancel_at_period_end: false,
        }
    }
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(sub: &Subscription) -> Self {
        Self {
            tier: sub.tier,
            status: sub.status,
            billing_cycle: sub.billing_cycle,
            amount: sub.amount.as_reais(),
            current_period_start: sub.current_period_start,
            current_period_end: sub.current_period_end,
            next_tier: sub.next_tier,
            next_billing_cycle: sub.next_billing_cycle,
            cancel_at_period_end: sub.cancel_at_period_end,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeaturesResponse {
    pub daily_limit: u32,
    pub monthly_limit: Option<u32>,
    pub unlimited_messages: bool,
    pub ai_enabled: bool,
    pub ai_daily_limit: u32,
    pub ai_monthly_limit: u32,
    pub priority_support: bool,
    pub campaign_tracking: bool,
}

impl From<Features> for FeaturesResponse {
    fn from(features: Features) -> Self {
        Self {
            daily_limit: features
                .daily_message_limit
                .unwrap_or(UNLIMITED_DAILY_LIMIT),
            monthly_limit: features.monthly_message_limit,
            unlimited_messages: features.unlimited_messages(),
            ai_enabled: features.ai_enabled,
            ai_daily_limit: features.ai_daily_limit,
            ai_monthly_limit: features.ai_monthly_limit,
            priority_support: features.priority_support,
            campaign_tracking: features.campaign_tracking,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageResponse {
    pub messages_sent_today: u32,
    pub ai_generations_today: u32,
    pub campaigns_created_today: u32,
    pub messages_sent_month: u32,
    pub ai_generations_month: u32,
    pub campaigns_created_month: u32,
}

impl From<&UsageSnapshot> for UsageResponse {
    fn from(usage: &UsageSnapshot) -> Self {
        Self {
            messages_sent_today: usage.today.messages_sent,
            ai_generations_today: usage.today.ai_generations,
            campaigns_created_today: usage.today.campaigns_created,
            messages_sent_month: usage.month_to_date.messages_sent,
            ai_generations_month: usage.month_to_date.ai_generations,
            campaigns_created_month: usage.month_to_date.campaigns_created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessMessageResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessMessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// `get_info` answer for the account page.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionInfoResponse {
    pub clinic: ClinicSummaryResponse,
    pub subscription: SubscriptionResponse,
    /// Checkout link per plan, keyed like `upgrade_pro_monthly`.
    pub links: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClinicSummaryResponse {
    pub name: String,
    pub clinic_name: Option<String>,
    pub tier: Tier,
}

impl From<&Clinic> for ClinicSummaryResponse {
    fn from(clinic: &Clinic) -> Self {
        Self {
            name: clinic.name.clone(),
            clinic_name: clinic.clinic_name.clone(),
            tier: clinic.tier,
        }
    }
}

/// Public fields returned by the email lookup.
#[derive(Debug, Clone, Serialize)]
pub struct ClinicLookupResponse {
    pub name: String,
    pub clinic_name: Option<String>,
    pub license_key: String,
    pub phone: Option<String>,
}

impl From<&Clinic> for ClinicLookupResponse {
    fn from(clinic: &Clinic) -> Self {
        Self {
            name: clinic.name.clone(),
            clinic_name: clinic.clinic_name.clone(),
            license_key: clinic.license_key.to_string(),
            phone: clinic.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordUsageResponse {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub usage: UsageResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_daily_renders_sentinel() {
        let features = FeaturesResponse::from(Features::premium());

        assert_eq!(features.daily_limit, UNLIMITED_DAILY_LIMIT);
        assert_eq!(features.monthly_limit, None);
        assert!(features.unlimited_messages);
    }

    #[test]
    fn capped_daily_renders_limit() {
        let features = FeaturesResponse::from(Features::pro());

        assert_eq!(features.daily_limit, 50);
        assert_eq!(features.monthly_limit, Some(500));
        assert!(!features.unlimited_messages);
    }

    #[test]
    fn record_usage_accepts_type_field() {
        let request: RecordUsageRequest = serde_json::from_str(
            r#"{"license_key":"LKRP-AAAA-BBBB-CCCC","type":"messages_sent","amount":3}"#,
        )
        .unwrap();

        assert_eq!(request.kind, "messages_sent");
        assert_eq!(request.amount, Some(3));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let request: ManageSubscriptionRequest = serde_json::from_str("{}").unwrap();

        assert!(request.email.is_empty());
        assert!(request.action.is_none());
    }

    #[test]
    fn free_default_serializes_uppercase_tier() {
        let json = serde_json::to_value(SubscriptionResponse::free_default()).unwrap();

        assert_eq!(json["tier"], "FREE");
        assert_eq!(json["status"], "active");
    }
}
