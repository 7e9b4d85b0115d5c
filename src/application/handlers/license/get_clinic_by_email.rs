//! GetClinicByEmailHandler - Clinic lookup used by the landing site to
//! prefill the download page.

use std::sync::Arc;

use crate::domain::clinic::Clinic;
use crate::domain::foundation::normalize_email;
use crate::domain::subscription::SubscriptionError;
use crate::ports::ClinicRepository;

#[derive(Debug, Clone)]
pub struct GetClinicByEmailQuery {
    pub email: String,
}

pub struct GetClinicByEmailHandler {
    clinics: Arc<dyn ClinicRepository>,
}

impl GetClinicByEmailHandler {
    pub fn new(clinics: Arc<dyn ClinicRepository>) -> Self {
        Self { clinics }
    }

    pub async fn handle(&self, query: GetClinicByEmailQuery) -> Result<Clinic, SubscriptionError> {
        if query.email.trim().is_empty() {
            return Err(SubscriptionError::validation("email", "Email is required"));
        }
        // An address that cannot be normalized cannot belong to any clinic.
        let email = normalize_email(&query.email).map_err(|_| SubscriptionError::ClinicNotFound)?;

        self.clinics
            .find_by_email(&email)
            .await?
            .ok_or(SubscriptionError::ClinicNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryClinicRepository;
    use crate::domain::clinic::{LicenseKey, NewClinic};
    use crate::domain::foundation::{ClinicId, Timestamp};

    async fn handler_with_clinic() -> (GetClinicByEmailHandler, Clinic) {
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let clinic = Clinic::register(
            ClinicId::new(),
            &NewClinic::from_email("dra@clinica.com.br"),
            LicenseKey::generate(),
            Timestamp::now(),
        )
        .unwrap();
        clinics.insert(&clinic).await.unwrap();
        (GetClinicByEmailHandler::new(clinics), clinic)
    }

    fn query(email: &str) -> GetClinicByEmailQuery {
        GetClinicByEmailQuery {
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn finds_clinic_case_insensitively() {
        let (handler, clinic) = handler_with_clinic().await;

        let found = handler.handle(query("DRA@Clinica.com.br ")).await.unwrap();

        assert_eq!(found.id, clinic.id);
    }

    #[tokio::test]
    async fn unknown_or_malformed_email_is_not_found() {
        let (handler, _) = handler_with_clinic().await;

        assert_eq!(
            handler.handle(query("outra@clinica.com.br")).await.unwrap_err(),
            SubscriptionError::ClinicNotFound
        );
        assert_eq!(
            handler.handle(query("sem-arroba")).await.unwrap_err(),
            SubscriptionError::ClinicNotFound
        );
    }

    #[tokio::test]
    async fn blank_email_is_required() {
        let (handler, _) = handler_with_clinic().await;

        let err = handler.handle(query("")).await.unwrap_err();

        assert_eq!(err.message(), "Email is required");
    }
}
