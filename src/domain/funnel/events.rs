//! Funnel events posted by the landing site.
//!
//! The wire shape is `{eventType, sessionId, data}` where `data` keys are
//! camelCase. Parsing turns that loose shape into a typed event up front so
//! the tracking handler only deals with known cases.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::foundation::Timestamp;

use super::{CalculatorInputs, ContactDetails, FunnelError};

/// Request context captured alongside page views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub ip_address: Option<String>,
}

/// Loose `data` object. Every key is optional; numbers may arrive as
/// strings from older site builds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EventData {
    #[serde(deserialize_with = "lenient_f64")]
    total_patients: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    ticket_medio: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    inactive_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    lost_revenue: Option<f64>,
    clinic_name: Option<String>,
    name: Option<String>,
    email: Option<String>,
    whatsapp: Option<String>,
    page: Option<String>,
    plan_type: Option<String>,
    license_key: Option<String>,
    source_page: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    amount: Option<f64>,
    payment_id: Option<Value>,
    event_name: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    value: Option<f64>,
    metadata: Option<Value>,
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

impl EventData {
    fn calculator(&self) -> CalculatorInputs {
        CalculatorInputs {
            total_patients: self.total_patients.map(|n| n.round() as i32),
            average_ticket: self.ticket_medio,
            inactive_percent: self.inactive_percent,
            lost_revenue: self.lost_revenue,
        }
    }

    fn contact(&self) -> ContactDetails {
        ContactDetails {
            clinic_name: non_blank(&self.clinic_name),
            name: non_blank(&self.name),
            email: non_blank(&self.email).map(|e| e.to_lowercase()),
            whatsapp: non_blank(&self.whatsapp),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A download of the desktop app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadDetails {
    pub email: Option<String>,
    /// `free`, `professional`/`pro` or `premium`.
    pub plan_type: String,
    pub license_key: Option<String>,
    pub source_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub email: Option<String>,
    pub plan_type: Option<String>,
    pub amount: Option<f64>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionDetails {
    pub event_name: String,
    pub value: f64,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunnelEvent {
    PageView {
        page: Option<String>,
    },
    LeadStarted,
    LeadStep1(CalculatorInputs),
    LeadStep2(ContactDetails),
    LeadCompleted {
        calculator: CalculatorInputs,
        contact: ContactDetails,
    },
    TrialActivated {
        email: Option<String>,
    },
    Download(DownloadDetails),
    PaymentInitiated(PaymentDetails),
    PaymentCompleted(PaymentDetails),
    Conversion(ConversionDetails),
}

impl FunnelEvent {
    pub fn parse(event_type: &str, data: Option<&Value>) -> Result<Self, FunnelError> {
        let data: EventData = match data {
            Some(Value::Null) | None => EventData::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| FunnelError::validation("data", e.to_string()))?,
        };

        let event = match event_type {
            "page_view" => FunnelEvent::PageView {
                page: non_blank(&data.page),
            },
            "lead_started" => FunnelEvent::LeadStarted,
            "lead_step1" => FunnelEvent::LeadStep1(data.calculator()),
            "lead_step2" => FunnelEvent::LeadStep2(data.contact()),
            "lead_completed" => FunnelEvent::LeadCompleted {
                calculator: data.calculator(),
                contact: data.contact(),
            },
            "trial_activated" => FunnelEvent::TrialActivated {
                email: data.contact().email,
            },
            "download" => FunnelEvent::Download(DownloadDetails {
                email: data.contact().email,
                plan_type: non_blank(&data.plan_type).unwrap_or_else(|| "free".to_string()),
                license_key: non_blank(&data.license_key),
                source_page: non_blank(&data.source_page),
            }),
            "payment_initiated" => FunnelEvent::PaymentInitiated(data.payment()),
            "payment_completed" => FunnelEvent::PaymentCompleted(data.payment()),
            "conversion" => {
                let event_name = non_blank(&data.event_name)
                    .ok_or_else(|| FunnelError::validation("eventName", "eventName is required"))?;
                FunnelEvent::Conversion(ConversionDetails {
                    event_name,
                    value: data.value.unwrap_or(0.0),
                    data: data.metadata.clone().unwrap_or_else(|| Value::Object(Default::default())),
                })
            }
            _ => return Err(FunnelError::validation("eventType", "Invalid eventType")),
        };
        Ok(event)
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            FunnelEvent::PageView { .. } => "page_view",
            FunnelEvent::LeadStarted => "lead_started",
            FunnelEvent::LeadStep1(_) => "lead_step1",
            FunnelEvent::LeadStep2(_) => "lead_step2",
            FunnelEvent::LeadCompleted { .. } => "lead_completed",
            FunnelEvent::TrialActivated { .. } => "trial_activated",
            FunnelEvent::Download(_) => "download",
            FunnelEvent::PaymentInitiated(_) => "payment_initiated",
            FunnelEvent::PaymentCompleted(_) => "payment_completed",
            FunnelEvent::Conversion(_) => "conversion",
        }
    }
}

impl EventData {
    fn payment(&self) -> PaymentDetails {
        PaymentDetails {
            email: self.contact().email,
            plan_type: non_blank(&self.plan_type),
            amount: self.amount,
            payment_id: self.payment_id.as_ref().and_then(|id| match id {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        }
    }
}

/// Status of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentEventStatus {
    Initiated,
    Completed,
}

impl PaymentEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEventStatus::Initiated => "initiated",
            PaymentEventStatus::Completed => "completed",
        }
    }
}

/// Provider recorded on every payment event.
pub const PAYMENT_PROVIDER: &str = "mercadopago";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageViewRecord {
    pub session_id: String,
    pub page: Option<String>,
    pub meta: RequestMeta,
    pub occurred_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub session_id: String,
    pub details: DownloadDetails,
    pub occurred_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEventRecord {
    pub session_id: String,
    pub details: PaymentDetails,
    pub status: PaymentEventStatus,
    pub occurred_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub session_id: String,
    pub details: ConversionDetails,
    pub occurred_at: Timestamp,
}

impl ConversionRecord {
    /// Conversion logged alongside a payment event.
    pub fn for_payment(
        session_id: &str,
        payment: &PaymentDetails,
        status: PaymentEventStatus,
        now: Timestamp,
    ) -> Self {
        let mut data = serde_json::json!({ "plan_type": payment.plan_type });
        let event_name = match status {
            PaymentEventStatus::Initiated => "InitiateCheckout",
            PaymentEventStatus::Completed => {
                data["payment_id"] = serde_json::json!(payment.payment_id);
                "Purchase"
            }
        };
        Self {
            session_id: session_id.to_string(),
            details: ConversionDetails {
                event_name: event_name.to_string(),
                value: payment.amount.unwrap_or(0.0),
                data,
            },
            occurred_at: now,
        }
    }

    /// Free registration logged when a trial is activated.
    pub fn free_registration(session_id: &str, now: Timestamp) -> Self {
        Self {
            session_id: session_id.to_string(),
            details: ConversionDetails {
                event_name: "CompleteRegistration".to_string(),
                value: 0.0,
                data: serde_json::json!({ "plan_type": "free" }),
            },
            occurred_at: now,
        }
    }
}
