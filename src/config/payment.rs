//! Payment configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::subscription::{BillingCycle, CheckoutLinks, PlanCode, Tier};

use super::error::ValidationError;

/// Payment configuration (Mercado Pago)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Server-to-server access token for the payments API
    #[serde(default)]
    pub mercadopago_access_token: String,

    /// Secret used to verify the `x-signature` webhook header. Verification is
    /// skipped when unset.
    pub webhook_secret: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Hosted checkout links per plan
    pub checkout_pro_monthly: Option<String>,
    pub checkout_pro_yearly: Option<String>,
    pub checkout_premium_monthly: Option<String>,
    pub checkout_premium_yearly: Option<String>,
}

impl PaymentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Build the checkout link table from the configured URLs
    pub fn checkout_links(&self) -> CheckoutLinks {
        let entries = [
            (Tier::Pro, BillingCycle::Monthly, &self.checkout_pro_monthly),
            (Tier::Pro, BillingCycle::Yearly, &self.checkout_pro_yearly),
            (Tier::Premium, BillingCycle::Monthly, &self.checkout_premium_monthly),
            (Tier::Premium, BillingCycle::Yearly, &self.checkout_premium_yearly),
        ];

        entries
            .into_iter()
            .filter_map(|(tier, cycle, url)| {
                let url = url.as_deref().filter(|u| !u.is_empty())?;
                let plan = PlanCode::new(tier, cycle).ok()?;
                Some((plan, url.to_string()))
            })
            .fold(CheckoutLinks::default(), |links, (plan, url)| {
                links.with_link(plan, url)
            })
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mercadopago_access_token.is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT__MERCADOPAGO_ACCESS_TOKEN",
            ));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidUrl("PAYMENT__API_BASE_URL"));
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            mercadopago_access_token: String::new(),
            webhook_secret: None,
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout(),
            checkout_pro_monthly: None,
            checkout_pro_yearly: None,
            checkout_premium_monthly: None,
            checkout_premium_yearly: None,
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.mercadopago.com".to_string()
}

fn default_timeout() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ClinicId;

    #[test]
    fn test_validation_requires_access_token() {
        let config = PaymentConfig::default();
        assert!(config.validate().is_err());

        let config = PaymentConfig {
            mercadopago_access_token: "APP_USR-123".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_webhook_secret_disables_verification() {
        let config = PaymentConfig {
            webhook_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(config.webhook_secret().is_none());
    }

    #[test]
    fn test_checkout_links_only_include_configured_plans() {
        let config = PaymentConfig {
            checkout_pro_monthly: Some("https://mpago.la/pro-m".to_string()),
            checkout_premium_yearly: Some(String::new()),
            ..Default::default()
        };

        let links = config.checkout_links();
        let clinic = ClinicId::new();
        let pro = PlanCode::new(Tier::Pro, BillingCycle::Monthly).unwrap();
        let premium = PlanCode::new(Tier::Premium, BillingCycle::Yearly).unwrap();

        assert_eq!(
            links.url_for(pro, &clinic),
            Some(format!("https://mpago.la/pro-m?external_reference={}", clinic))
        );
        assert!(links.url_for(premium, &clinic).is_none());
    }
}
