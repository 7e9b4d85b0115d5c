//! ResendLicenseHandler - Emails the license key for an email address,
//! creating a FREE trial account first when none exists.

use std::sync::Arc;

use crate::application::handlers::signup::{
    ProvisionTrialAccountCommand, ProvisionTrialAccountHandler,
};
use crate::application::notifications::free_license_email;
use crate::domain::clinic::{Clinic, NewClinic};
use crate::domain::subscription::SubscriptionError;
use crate::ports::EmailSender;

#[derive(Debug, Clone)]
pub struct ResendLicenseCommand {
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct ResendLicenseResult {
    pub clinic: Clinic,
    pub created: bool,
    pub email_sent: bool,
}

impl ResendLicenseResult {
    pub fn message(&self) -> &'static str {
        if self.created {
            "Nova chave criada e enviada por email."
        } else {
            "Chave existente reenviada por email."
        }
    }
}

pub struct ResendLicenseHandler {
    provision: ProvisionTrialAccountHandler,
    email: Arc<dyn EmailSender>,
}

impl ResendLicenseHandler {
    pub fn new(provision: ProvisionTrialAccountHandler, email: Arc<dyn EmailSender>) -> Self {
        Self { provision, email }
    }

    pub async fn handle(
        &self,
        cmd: ResendLicenseCommand,
    ) -> Result<ResendLicenseResult, SubscriptionError> {
        if cmd.email.trim().is_empty() {
            return Err(SubscriptionError::validation("email", "Email is required"));
        }

        // 1. Find or create
        let account = self
            .provision
            .handle(ProvisionTrialAccountCommand {
                registration: NewClinic::from_email(cmd.email),
            })
            .await?;

        // 2. Email, best effort
        let email_sent = match self.email.send(&free_license_email(&account.clinic)).await {
            Ok(message_id) => {
                tracing::info!(clinic_id = %account.clinic.id, message_id = %message_id, "license email sent");
                true
            }
            Err(err) => {
                tracing::warn!(clinic_id = %account.clinic.id, error = %err, "license email failed");
                false
            }
        };

        Ok(ResendLicenseResult {
            clinic: account.clinic,
            created: account.created,
            email_sent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryClinicRepository, InMemorySubscriptionLedger, InMemorySubscriptionRepository,
        RecordingEmailSender,
    };
    use crate::application::handlers::subscription::CreateTrialHandler;

    fn handler(email: Arc<RecordingEmailSender>) -> (ResendLicenseHandler, Arc<InMemoryClinicRepository>) {
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let create_trial = CreateTrialHandler::new(
            Arc::new(InMemorySubscriptionRepository::new()),
            Arc::new(InMemorySubscriptionLedger::new()),
            14,
        );
        let provision = ProvisionTrialAccountHandler::new(clinics.clone(), create_trial);
        (ResendLicenseHandler::new(provision, email), clinics)
    }

    fn command(email: &str) -> ResendLicenseCommand {
        ResendLicenseCommand {
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn new_email_creates_account_and_sends_key() {
        let email = Arc::new(RecordingEmailSender::new());
        let (handler, _) = handler(email.clone());

        let result = handler.handle(command("nova@clinica.com.br")).await.unwrap();

        assert!(result.created);
        assert!(result.email_sent);
        assert_eq!(result.message(), "Nova chave criada e enviada por email.");
        let sent = email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "nova@clinica.com.br");
        assert!(sent[0]
            .text
            .as_deref()
            .unwrap()
            .contains(result.clinic.license_key.as_str()));
    }

    #[tokio::test]
    async fn existing_email_resends_same_key() {
        let email = Arc::new(RecordingEmailSender::new());
        let (handler, clinics) = handler(email.clone());
        let first = handler.handle(command("dra@clinica.com.br")).await.unwrap();

        let second = handler.handle(command("dra@clinica.com.br")).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.message(), "Chave existente reenviada por email.");
        assert_eq!(second.clinic.license_key, first.clinic.license_key);
        assert_eq!(clinics.len(), 1);
        assert_eq!(email.sent().len(), 2);
    }

    #[tokio::test]
    async fn email_failure_does_not_fail_request() {
        let (handler, clinics) = handler(Arc::new(RecordingEmailSender::failing()));

        let result = handler.handle(command("dra@clinica.com.br")).await.unwrap();

        assert!(!result.email_sent);
        assert_eq!(clinics.len(), 1);
    }

    #[tokio::test]
    async fn blank_email_is_required() {
        let (handler, _) = handler(Arc::new(RecordingEmailSender::new()));

        let err = handler.handle(command(" ")).await.unwrap_err();

        assert_eq!(err.message(), "Email is required");
    }
}
