//! Which integrations a running instance was configured with.
//!
//! Only presence is reported; no value ever leaves this module.

use serde::Serialize;

use super::server::Environment;
use super::AppConfig;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigReport {
    pub environment: Environment,
    pub in_memory_storage: bool,
    pub database: bool,
    pub redis: bool,
    pub service_token: bool,
    pub admin_dashboard_token: bool,
    pub mercadopago: bool,
    pub webhook_signatures: bool,
    /// Plan codes that have a checkout link, e.g. `PRO_monthly`.
    pub checkout_plans: Vec<String>,
    pub email: bool,
    pub openai: bool,
    pub conversions: bool,
}

impl ConfigReport {
    /// Settings the service cannot take payments or serve clients without.
    pub fn missing(&self) -> Vec<&'static str> {
        let required = [
            ("database", self.database || self.in_memory_storage),
            ("service_token", self.service_token),
            ("mercadopago", self.mercadopago),
        ];
        required
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Nothing configured; what a bare in-memory instance reports.
impl Default for ConfigReport {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            in_memory_storage: true,
            database: false,
            redis: false,
            service_token: false,
            admin_dashboard_token: false,
            mercadopago: false,
            webhook_signatures: false,
            checkout_plans: Vec::new(),
            email: false,
            openai: false,
            conversions: false,
        }
    }
}

impl AppConfig {
    pub fn report(&self) -> ConfigReport {
        let mut checkout_plans: Vec<String> = self
            .payment
            .checkout_links()
            .plans()
            .into_iter()
            .map(|plan| plan.to_string())
            .collect();
        checkout_plans.sort();

        ConfigReport {
            environment: self.server.environment,
            in_memory_storage: self.features.in_memory_storage,
            database: !self.database.url.trim().is_empty(),
            redis: self.redis.url().is_some(),
            service_token: !self.auth.service_token.trim().is_empty(),
            admin_dashboard_token: self.auth.admin_dashboard_token().is_some(),
            mercadopago: !self.payment.mercadopago_access_token.trim().is_empty(),
            webhook_signatures: self.payment.webhook_secret().is_some(),
            checkout_plans,
            email: self.email.is_configured(),
            openai: self.ai.has_openai(),
            conversions: self.conversions.is_configured(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_instance_misses_credentials() {
        let report = ConfigReport::default();

        assert_eq!(report.missing(), vec!["service_token", "mercadopago"]);
        assert!(!report.is_complete());
    }

    #[test]
    fn database_is_required_outside_memory_mode() {
        let report = ConfigReport {
            in_memory_storage: false,
            service_token: true,
            mercadopago: true,
            ..ConfigReport::default()
        };
        assert_eq!(report.missing(), vec!["database"]);

        let report = ConfigReport {
            database: true,
            ..report
        };
        assert!(report.is_complete());
    }

    #[test]
    fn serializes_presence_flags_only() {
        let report = ConfigReport {
            checkout_plans: vec!["PRO_monthly".to_string()],
            ..ConfigReport::default()
        };

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["environment"], "development");
        assert_eq!(json["checkout_plans"][0], "PRO_monthly");
        assert_eq!(json["mercadopago"], false);
    }
}
