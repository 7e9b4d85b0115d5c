//! Facebook Conversions API adapter.
//!
//! Posts `{ data: [event], test_event_code? }` to
//! `{base}/{version}/{pixel_id}/events?access_token=...`.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::ConversionsConfig;
use crate::ports::{ConversionError, ConversionEvent, ConversionsApi};

pub struct GraphConversionsApi {
    pixel_id: String,
    access_token: SecretString,
    test_event_code: Option<String>,
    endpoint_base: String,
    client: Client,
}

impl GraphConversionsApi {
    pub fn new(config: &ConversionsConfig) -> Result<Self, ConversionError> {
        let (Some(pixel_id), Some(access_token)) = (
            config.pixel_id.clone().filter(|p| !p.is_empty()),
            config.access_token.clone().filter(|t| !t.is_empty()),
        ) else {
            return Err(ConversionError::NotConfigured);
        };

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConversionError::Network(e.to_string()))?;

        Ok(Self {
            pixel_id,
            access_token: SecretString::new(access_token),
            test_event_code: config.test_event_code.clone().filter(|c| !c.is_empty()),
            endpoint_base: format!(
                "{}/{}",
                config.api_base_url.trim_end_matches('/'),
                config.api_version
            ),
            client,
        })
    }

    fn events_url(&self) -> String {
        format!("{}/{}/events", self.endpoint_base, self.pixel_id)
    }

    fn payload<'a>(&'a self, event: &'a ConversionEvent) -> EventsPayload<'a> {
        EventsPayload {
            data: [event],
            test_event_code: self.test_event_code.as_deref(),
        }
    }
}

#[async_trait]
impl ConversionsApi for GraphConversionsApi {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, event: &ConversionEvent) -> Result<(), ConversionError> {
        let response = self
            .client
            .post(self.events_url())
            .query(&[("access_token", self.access_token.expose_secret().as_str())])
            .json(&self.payload(event))
            .send()
            .await
            .map_err(|e| ConversionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                event_name = %event.event_name,
                "Conversions API rejected event"
            );
            return Err(ConversionError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::debug!(
            event_name = %event.event_name,
            event_id = %event.event_id,
            "Conversion event forwarded"
        );
        Ok(())
    }
}

/// Used when the pixel or token is missing. Every send reports
/// `NotConfigured`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledConversionsApi;

#[async_trait]
impl ConversionsApi for DisabledConversionsApi {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn send(&self, _event: &ConversionEvent) -> Result<(), ConversionError> {
        Err(ConversionError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct EventsPayload<'a> {
    data: [&'a ConversionEvent; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    test_event_code: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::HashedUserData;

    fn configured() -> ConversionsConfig {
        ConversionsConfig {
            pixel_id: Some("123456".to_string()),
            access_token: Some("EAAB".to_string()),
            test_event_code: Some("TEST42".to_string()),
            ..ConversionsConfig::default()
        }
    }

    fn event() -> ConversionEvent {
        ConversionEvent {
            event_name: "Lead".to_string(),
            event_time: 1_700_000_000,
            event_id: "Lead_1_abc".to_string(),
            action_source: "website",
            event_source_url: "https://lkdigital.org/".to_string(),
            user_data: HashedUserData::default(),
            custom_data: None,
        }
    }

    #[test]
    fn missing_credentials_are_not_configured() {
        assert!(matches!(
            GraphConversionsApi::new(&ConversionsConfig::default()),
            Err(ConversionError::NotConfigured)
        ));
    }

    #[test]
    fn events_url_includes_version_and_pixel() {
        let api = GraphConversionsApi::new(&configured()).unwrap();
        assert_eq!(
            api.events_url(),
            "https://graph.facebook.com/v18.0/123456/events"
        );
    }

    #[test]
    fn payload_wraps_event_and_test_code() {
        let api = GraphConversionsApi::new(&configured()).unwrap();
        let event = event();
        let body = serde_json::to_value(api.payload(&event)).unwrap();

        assert_eq!(body["data"][0]["event_name"], "Lead");
        assert_eq!(body["data"][0]["action_source"], "website");
        assert_eq!(body["test_event_code"], "TEST42");
    }

    #[tokio::test]
    async fn disabled_api_refuses_to_send() {
        assert!(!DisabledConversionsApi.is_enabled());
        assert_eq!(
            DisabledConversionsApi.send(&event()).await,
            Err(ConversionError::NotConfigured)
        );
    }
}
