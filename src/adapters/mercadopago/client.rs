//! Mercado Pago payments API client.
//!
//! Implements the `PaymentGateway` port. Only the single-payment lookup is
//! needed: webhooks carry a payment id, everything else comes from
//! `GET /v1/payments/{id}`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;

use crate::config::PaymentConfig;
use crate::ports::{PaymentError, PaymentGateway, ProviderPayment};

/// Mercado Pago API configuration.
#[derive(Clone)]
pub struct MercadoPagoConfig {
    access_token: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl MercadoPagoConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            api_base_url: "https://api.mercadopago.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_app_config(config: &PaymentConfig) -> Self {
        Self {
            access_token: SecretString::new(config.mercadopago_access_token.clone()),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    fn is_configured(&self) -> bool {
        !self.access_token.expose_secret().trim().is_empty()
    }
}

pub struct MercadoPagoGateway {
    config: MercadoPagoConfig,
    http_client: reqwest::Client,
}

impl MercadoPagoGateway {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Network(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<ProviderPayment>, PaymentError> {
        if !self.config.is_configured() {
            tracing::error!("Mercado Pago access token missing");
            return Err(PaymentError::NotConfigured);
        }

        // Ids come from unauthenticated webhook bodies and end up in the path.
        if !is_payment_id(payment_id) {
            tracing::warn!(payment_id = %payment_id, "ignoring non-numeric payment id");
            return Ok(None);
        }

        let url = format!("{}/v1/payments/{}", self.config.api_base_url, payment_id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(PaymentError::Authentication(format!(
                "Mercado Pago rejected the access token ({})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let payment: MpPayment = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        Ok(Some(payment.into_provider_payment()))
    }
}

/// Mercado Pago payment ids are numeric.
fn is_payment_id(raw: &str) -> bool {
    !raw.is_empty() && raw.len() <= 32 && raw.bytes().all(|b| b.is_ascii_digit())
}

// ════════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct MpPayment {
    id: Value,
    #[serde(default)]
    status: String,
    external_reference: Option<String>,
    transaction_amount: Option<f64>,
    #[serde(default)]
    metadata: Option<Value>,
    additional_info: Option<MpAdditionalInfo>,
    payer: Option<MpPayer>,
}

#[derive(Debug, Deserialize)]
struct MpAdditionalInfo {
    #[serde(default)]
    items: Vec<MpItem>,
}

#[derive(Debug, Deserialize)]
struct MpItem {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpPayer {
    email: Option<String>,
}

impl MpPayment {
    fn into_provider_payment(self) -> ProviderPayment {
        let plan_reference = self
            .metadata
            .as_ref()
            .and_then(|m| m.get("plan"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                self.additional_info
                    .as_ref()
                    .and_then(|info| info.items.first())
                    .and_then(|item| item.id.clone())
            })
            .filter(|p| !p.trim().is_empty());

        let id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };

        ProviderPayment {
            id,
            status: self.status,
            external_reference: self.external_reference.filter(|r| !r.trim().is_empty()),
            transaction_amount: self.transaction_amount,
            plan_reference,
            payer_email: self.payer.and_then(|p| p.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> ProviderPayment {
        serde_json::from_value::<MpPayment>(value)
            .unwrap()
            .into_provider_payment()
    }

    #[test]
    fn only_numeric_ids_are_payment_ids() {
        assert!(is_payment_id("1234567890"));
        assert!(!is_payment_id(""));
        assert!(!is_payment_id("../users/me"));
        assert!(!is_payment_id("123?access_token=x"));
        assert!(!is_payment_id("12 34"));
    }

    #[tokio::test]
    async fn path_like_id_never_reaches_the_api() {
        // Nothing listens on the discard port; a request would fail with Network.
        let gateway = MercadoPagoGateway::new(
            MercadoPagoConfig::new("APP_USR-test").with_base_url("http://127.0.0.1:9"),
        )
        .unwrap();

        let result = gateway.fetch_payment("../v1/users/me").await;

        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn numeric_id_is_stringified() {
        let payment = parse(json!({
            "id": 1234567890u64,
            "status": "approved",
            "external_reference": "c0ffee00-0000-0000-0000-000000000000",
            "transaction_amount": 197.0
        }));
        assert_eq!(payment.id, "1234567890");
        assert!(payment.is_approved());
        assert_eq!(payment.transaction_amount, Some(197.0));
        assert_eq!(payment.plan_reference, None);
    }

    #[test]
    fn plan_reference_prefers_metadata() {
        let payment = parse(json!({
            "id": "1",
            "status": "approved",
            "metadata": { "plan": "PREMIUM_yearly" },
            "additional_info": { "items": [{ "id": "PRO_monthly" }] }
        }));
        assert_eq!(payment.plan_reference.as_deref(), Some("PREMIUM_yearly"));
    }

    #[test]
    fn plan_reference_falls_back_to_first_item() {
        let payment = parse(json!({
            "id": "1",
            "status": "pending",
            "additional_info": { "items": [{ "id": "PRO_yearly" }, { "id": "x" }] },
            "payer": { "email": "dr@clinica.com.br" }
        }));
        assert_eq!(payment.plan_reference.as_deref(), Some("PRO_yearly"));
        assert_eq!(payment.payer_email.as_deref(), Some("dr@clinica.com.br"));
        assert!(!payment.is_approved());
    }

    #[test]
    fn blank_external_reference_is_dropped() {
        let payment = parse(json!({ "id": 9, "status": "approved", "external_reference": "  " }));
        assert_eq!(payment.external_reference, None);
    }

    #[tokio::test]
    async fn missing_token_is_not_configured() {
        let gateway = MercadoPagoGateway::new(MercadoPagoConfig::new("")).unwrap();
        let result = gateway.fetch_payment("123").await;
        assert_eq!(result, Err(PaymentError::NotConfigured));
    }
}
