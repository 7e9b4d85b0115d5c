//! Payment gateway port.
//!
//! The webhook only carries a payment id; the handler fetches the payment
//! through this port to learn its status, amount and who it belongs to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetch a payment by the provider's id. `Ok(None)` when the provider
    /// does not know the id.
    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<ProviderPayment>, PaymentError>;
}

/// A payment as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayment {
    pub id: String,

    /// Provider status string, e.g. `approved`, `pending`, `rejected`.
    pub status: String,

    /// Our clinic id, set when the checkout link was built.
    pub external_reference: Option<String>,

    /// Amount paid, in reais.
    pub transaction_amount: Option<f64>,

    /// Explicit plan code (`PRO_monthly`) from payment metadata or the first
    /// item id, when the checkout carried one.
    pub plan_reference: Option<String>,

    pub payer_email: Option<String>,
}

impl ProviderPayment {
    pub fn is_approved(&self) -> bool {
        self.status.eq_ignore_ascii_case("approved")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("payment provider not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl PaymentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::Network(_) => true,
            PaymentError::Provider { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn approved_is_case_insensitive() {
        let payment = ProviderPayment {
            id: "1".to_string(),
            status: "APPROVED".to_string(),
            external_reference: None,
            transaction_amount: None,
            plan_reference: None,
            payer_email: None,
        };
        assert!(payment.is_approved());
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(PaymentError::Network("reset".into()).is_retryable());
        assert!(PaymentError::Provider { status: 503, message: String::new() }.is_retryable());
        assert!(!PaymentError::Provider { status: 404, message: String::new() }.is_retryable());
        assert!(!PaymentError::Authentication("bad token".into()).is_retryable());
    }
}
