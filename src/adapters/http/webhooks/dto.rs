//! HTTP DTOs for payment provider webhooks.

use serde::{Deserialize, Serialize};

use crate::domain::subscription::Tier;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Mercado Pago notification body: `{ "type": "payment", "data": { "id": ... } }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentNotification {
    #[serde(rename = "type", default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub data: Option<NotificationData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationData {
    /// Sent as a string by some integrations and as a number by others.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl PaymentNotification {
    pub fn payment_id(&self) -> Option<String> {
        match self.data.as_ref()?.id.as_ref()? {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement. Always sent with 200 so the provider stops retrying.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self {
            received: true,
            ..Self::default()
        }
    }

    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            received: true,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn activated(clinic_id: String, tier: Tier) -> Self {
        Self {
            received: true,
            processed: Some(true),
            clinic_id: Some(clinic_id),
            tier: Some(tier),
            status: Some("activated".to_string()),
            error: None,
        }
    }
}
