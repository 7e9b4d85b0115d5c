//! Canned stand-ins for the payment, email and LLM integrations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::campaign::DraftRequest;
use crate::ports::{
    DraftError, EmailError, EmailMessage, EmailSender, MessageDrafter, PaymentError,
    PaymentGateway, ProviderPayment,
};

use super::lock;

/// Serves payments registered up front.
#[derive(Default)]
pub struct StaticPaymentGateway {
    payments: Mutex<HashMap<String, ProviderPayment>>,
}

impl StaticPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, payment: ProviderPayment) {
        lock(&self.payments).insert(payment.id.clone(), payment);
    }

    /// Approved payment for `clinic_id` of `amount` reais.
    pub fn approved(id: &str, clinic_id: &str, amount: f64) -> ProviderPayment {
        ProviderPayment {
            id: id.to_string(),
            status: "approved".to_string(),
            external_reference: Some(clinic_id.to_string()),
            transaction_amount: Some(amount),
            plan_reference: None,
            payer_email: None,
        }
    }
}

#[async_trait]
impl PaymentGateway for StaticPaymentGateway {
    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<ProviderPayment>, PaymentError> {
        Ok(lock(&self.payments).get(payment_id).cloned())
    }
}

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every message, for exercising best-effort paths.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError> {
        if self.fail {
            return Err(EmailError::Rejected {
                status: 422,
                message: "simulated rejection".to_string(),
            });
        }
        let mut sent = lock(&self.sent);
        sent.push(message.clone());
        tracing::info!(to = %message.to, subject = %message.subject, "email recorded");
        Ok(format!("memory-{}", sent.len()))
    }
}

/// Returns a fixed draft, or behaves as unconfigured.
pub struct StaticMessageDrafter {
    reply: Option<String>,
    requests: Mutex<Vec<DraftRequest>>,
}

impl StaticMessageDrafter {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<DraftRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl MessageDrafter for StaticMessageDrafter {
    fn is_available(&self) -> bool {
        self.reply.is_some()
    }

    async fn draft(&self, request: &DraftRequest) -> Result<String, DraftError> {
        lock(&self.requests).push(request.clone());
        match &self.reply {
            Some(text) if text.trim().is_empty() => Err(DraftError::EmptyResponse),
            Some(text) => Ok(text.trim().to_string()),
            None => Err(DraftError::NotConfigured),
        }
    }
}
