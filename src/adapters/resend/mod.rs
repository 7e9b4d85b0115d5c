//! Resend email adapter.
//!
//! `ResendEmailSender` posts to `{base}/emails`. `LoggingEmailSender` stands
//! in outside production when no API key is configured.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::EmailConfig;
use crate::ports::{EmailError, EmailMessage, EmailSender};

pub struct ResendEmailSender {
    api_key: SecretString,
    from: String,
    api_base_url: String,
    client: Client,
}

impl ResendEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        if !config.is_configured() {
            return Err(EmailError::NotConfigured);
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EmailError::Network(e.to_string()))?;
        Ok(Self {
            api_key: SecretString::new(config.resend_api_key.clone()),
            from: config.from_header(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn to_request<'a>(&'a self, message: &'a EmailMessage) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &self.from,
            to: vec![&message.to],
            subject: &message.subject,
            html: &message.html,
            text: message.text.as_deref(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError> {
        let response = self
            .client
            .post(format!("{}/emails", self.api_base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.to_request(message))
            .send()
            .await
            .map_err(|e| EmailError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| EmailError::Network(format!("Failed to parse response: {}", e)))?;

        tracing::info!(email_id = %sent.id, subject = %message.subject, "Email sent");
        Ok(sent.id)
    }
}

/// Logs the message and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEmailSender;

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email delivery disabled; message logged only"
        );
        Ok("logged".to_string())
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> EmailConfig {
        EmailConfig {
            resend_api_key: "re_test".to_string(),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn unconfigured_sender_is_rejected() {
        assert!(matches!(
            ResendEmailSender::new(&EmailConfig::default()),
            Err(EmailError::NotConfigured)
        ));
    }

    #[test]
    fn request_body_shape() {
        let sender = ResendEmailSender::new(&configured()).unwrap();
        let message = EmailMessage {
            to: "dr@clinica.com.br".to_string(),
            subject: "Oi".to_string(),
            html: "<p>Oi</p>".to_string(),
            text: None,
        };
        let body = serde_json::to_value(sender.to_request(&message)).unwrap();

        assert_eq!(body["to"][0], "dr@clinica.com.br");
        assert_eq!(body["from"], configured().from_header());
        assert!(body.get("text").is_none());
    }

    #[tokio::test]
    async fn logging_sender_always_succeeds() {
        let message = EmailMessage {
            to: "a@b.com".to_string(),
            subject: "s".to_string(),
            html: String::new(),
            text: None,
        };
        assert_eq!(LoggingEmailSender.send(&message).await.unwrap(), "logged");
    }
}
