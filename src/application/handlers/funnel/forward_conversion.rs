//! ForwardConversionHandler - Relays a browser conversion event to the ad
//! platform with hashed contact details.
//!
//! Known event names get the same custom data the browser pixel sends so
//! the two can be deduplicated; anything else is forwarded as given. A
//! disabled or failing relay reports `false` rather than an error.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::domain::foundation::Timestamp;
use crate::domain::funnel::FunnelError;
use crate::ports::{ConversionEvent, ConversionsApi, CustomData, HashedUserData, RawUserData};

const DEFAULT_CURRENCY: &str = "BRL";

/// `customData` as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionCustomData {
    pub plan_type: Option<String>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub content_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ForwardConversionCommand {
    pub event_name: String,
    pub user_data: RawUserData,
    pub custom_data: Option<ConversionCustomData>,
    /// Page the event happened on (the request referer).
    pub source_url: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub cookies: Option<String>,
}

pub struct ForwardConversionHandler {
    api: Arc<dyn ConversionsApi>,
}

impl ForwardConversionHandler {
    pub fn new(api: Arc<dyn ConversionsApi>) -> Self {
        Self { api }
    }

    /// Returns whether the platform accepted the event.
    pub async fn handle(&self, cmd: ForwardConversionCommand) -> Result<bool, FunnelError> {
        let event_name = cmd.event_name.trim();
        if event_name.is_empty() {
            return Err(FunnelError::validation("eventName", "eventName is required"));
        }

        if !self.api.is_enabled() {
            tracing::warn!(event_name = %event_name, "conversions API not configured, event dropped");
            return Ok(false);
        }

        let now = Timestamp::now();
        let event = ConversionEvent {
            event_name: event_name.to_string(),
            event_time: now.as_unix_secs(),
            event_id: event_id(event_name, now),
            action_source: "website",
            event_source_url: cmd.source_url,
            user_data: HashedUserData::build(
                &cmd.user_data,
                cmd.client_ip.as_deref(),
                cmd.user_agent.as_deref(),
                cmd.cookies.as_deref(),
            ),
            custom_data: custom_data_for(event_name, cmd.custom_data),
        };

        match self.api.send(&event).await {
            Ok(()) => Ok(true),
            Err(err) => {
                tracing::warn!(event_name = %event.event_name, error = %err, "conversion relay failed");
                Ok(false)
            }
        }
    }
}

/// `{name}_{unix millis}_{13 random chars}`, matching the pixel's format.
fn event_id(event_name: &str, now: Timestamp) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(13)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}_{}_{}", event_name, now.as_unix_millis(), suffix)
}

fn custom_data_for(event_name: &str, custom: Option<ConversionCustomData>) -> Option<CustomData> {
    let plan_type = custom
        .as_ref()
        .and_then(|c| c.plan_type.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let value = custom.as_ref().and_then(|c| c.value).unwrap_or(0.0);

    match event_name {
        "PageView" => None,
        "Lead" => Some(CustomData {
            currency: DEFAULT_CURRENCY.to_string(),
            content_name: Some("Lead Form".to_string()),
            ..Default::default()
        }),
        "CompleteRegistration" => Some(product(value, format!("{} plan download", plan_type))),
        "InitiateCheckout" | "Purchase" => Some(product(value, format!("{} plan", plan_type))),
        _ => custom.map(|c| CustomData {
            currency: c.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            value: c.value,
            content_name: c.content_name,
            content_type: c.content_type,
        }),
    }
}

fn product(value: f64, content_name: String) -> CustomData {
    CustomData {
        currency: DEFAULT_CURRENCY.to_string(),
        value: Some(value),
        content_name: Some(content_name),
        content_type: Some("product".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::facebook::DisabledConversionsApi;
    use crate::ports::{hash_pii, ConversionError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingConversionsApi {
        sent: Mutex<Vec<ConversionEvent>>,
        reject: bool,
    }

    #[async_trait]
    impl ConversionsApi for RecordingConversionsApi {
        fn is_enabled(&self) -> bool {
            true
        }

        async fn send(&self, event: &ConversionEvent) -> Result<(), ConversionError> {
            if self.reject {
                return Err(ConversionError::Rejected {
                    status: 400,
                    message: "bad pixel".to_string(),
                });
            }
            self.sent.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn purchase() -> ForwardConversionCommand {
        ForwardConversionCommand {
            event_name: "Purchase".to_string(),
            user_data: RawUserData {
                email: Some("Ana@Sorriso.com.br".to_string()),
                ..Default::default()
            },
            custom_data: Some(ConversionCustomData {
                plan_type: Some("pro".to_string()),
                value: Some(197.0),
                ..Default::default()
            }),
            source_url: "https://lkreactor.com.br/obrigado".to_string(),
            client_ip: Some("::1".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            cookies: Some("_fbp=fb.1.1.2".to_string()),
        }
    }

    #[tokio::test]
    async fn purchase_is_forwarded_with_hashed_email_and_product_data() {
        let api = Arc::new(RecordingConversionsApi::default());
        let handler = ForwardConversionHandler::new(api.clone());

        assert!(handler.handle(purchase()).await.unwrap());

        let sent = api.sent.lock().unwrap();
        let event = &sent[0];
        assert_eq!(event.action_source, "website");
        assert!(event.event_id.starts_with("Purchase_"));
        assert_eq!(event.event_id.split('_').nth(2).unwrap().len(), 13);
        assert_eq!(event.user_data.em, vec![hash_pii("ana@sorriso.com.br")]);
        assert_eq!(event.user_data.client_ip_address.as_deref(), Some("127.0.0.1"));
        let custom = event.custom_data.as_ref().unwrap();
        assert_eq!(custom.currency, "BRL");
        assert_eq!(custom.value, Some(197.0));
        assert_eq!(custom.content_name.as_deref(), Some("pro plan"));
    }

    #[tokio::test]
    async fn page_view_has_no_custom_data() {
        let api = Arc::new(RecordingConversionsApi::default());
        let handler = ForwardConversionHandler::new(api.clone());

        let mut cmd = purchase();
        cmd.event_name = "PageView".to_string();
        handler.handle(cmd).await.unwrap();

        assert!(api.sent.lock().unwrap()[0].custom_data.is_none());
    }

    #[tokio::test]
    async fn generic_event_keeps_caller_custom_data() {
        let api = Arc::new(RecordingConversionsApi::default());
        let handler = ForwardConversionHandler::new(api.clone());

        let mut cmd = purchase();
        cmd.event_name = "Contact".to_string();
        cmd.custom_data = Some(ConversionCustomData {
            currency: Some("USD".to_string()),
            content_name: Some("whatsapp".to_string()),
            ..Default::default()
        });
        handler.handle(cmd).await.unwrap();

        let custom = api.sent.lock().unwrap()[0].custom_data.clone().unwrap();
        assert_eq!(custom.currency, "USD");
        assert_eq!(custom.content_name.as_deref(), Some("whatsapp"));
    }

    #[tokio::test]
    async fn disabled_or_rejecting_relay_reports_false() {
        let disabled = ForwardConversionHandler::new(Arc::new(DisabledConversionsApi));
        assert!(!disabled.handle(purchase()).await.unwrap());

        let rejecting = ForwardConversionHandler::new(Arc::new(RecordingConversionsApi {
            reject: true,
            ..Default::default()
        }));
        assert!(!rejecting.handle(purchase()).await.unwrap());
    }

    #[tokio::test]
    async fn event_name_is_required() {
        let handler = ForwardConversionHandler::new(Arc::new(RecordingConversionsApi::default()));
        let mut cmd = purchase();
        cmd.event_name = " ".to_string();

        assert!(handler.handle(cmd).await.is_err());
    }
}
