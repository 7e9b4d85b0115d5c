//! HTTP DTOs for landing-site funnel endpoints.
//!
//! The landing site posts camelCase JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::handlers::funnel::ConversionCustomData;
use crate::ports::RawUserData;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Event payload; its shape depends on `eventType`.
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub user_data: Option<UserDataRequest>,
    #[serde(default)]
    pub custom_data: Option<CustomDataRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl From<UserDataRequest> for RawUserData {
    fn from(user: UserDataRequest) -> Self {
        Self {
            email: user.email,
            phone: user.phone,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDataRequest {
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub content_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl From<CustomDataRequest> for ConversionCustomData {
    fn from(custom: CustomDataRequest) -> Self {
        Self {
            plan_type: custom.plan_type,
            value: custom.value,
            currency: custom.currency,
            content_name: custom.content_name,
            content_type: custom.content_type,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_request_reads_nested_camel_case() {
        let request: ConversionRequest = serde_json::from_str(
            r#"{"eventName":"Lead","userData":{"email":"a@b.com","firstName":"Ana"},"customData":{"planType":"PRO","value":99.9}}"#,
        )
        .unwrap();

        let user = RawUserData::from(request.user_data.unwrap());
        let custom = ConversionCustomData::from(request.custom_data.unwrap());

        assert_eq!(request.event_name, "Lead");
        assert_eq!(user.first_name.as_deref(), Some("Ana"));
        assert_eq!(custom.plan_type.as_deref(), Some("PRO"));
        assert_eq!(custom.value, Some(99.9));
    }
}
