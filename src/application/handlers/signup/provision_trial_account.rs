//! ProvisionTrialAccountHandler - Find-or-create for FREE trial accounts.
//!
//! Used by license resend and lead completion, where the visitor only gave
//! us an email (and maybe a name). An existing clinic is returned as is.

use std::sync::Arc;

use crate::application::handlers::subscription::{CreateTrialCommand, CreateTrialHandler};
use crate::domain::clinic::{Clinic, NewClinic};
use crate::domain::foundation::{normalize_email, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionError, Tier};
use crate::ports::ClinicRepository;

use super::insert_clinic;

#[derive(Debug, Clone)]
pub struct ProvisionTrialAccountCommand {
    pub registration: NewClinic,
}

#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub clinic: Clinic,
    /// Set only when the account was created by this call.
    pub subscription: Option<Subscription>,
    pub created: bool,
}

pub struct ProvisionTrialAccountHandler {
    clinics: Arc<dyn ClinicRepository>,
    create_trial: CreateTrialHandler,
}

impl ProvisionTrialAccountHandler {
    pub fn new(clinics: Arc<dyn ClinicRepository>, create_trial: CreateTrialHandler) -> Self {
        Self {
            clinics,
            create_trial,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProvisionTrialAccountCommand,
    ) -> Result<ProvisionedAccount, SubscriptionError> {
        let email = normalize_email(&cmd.registration.email)?;

        // 1. Existing account
        if let Some(clinic) = self.clinics.find_by_email(&email).await? {
            return Ok(ProvisionedAccount {
                clinic,
                subscription: None,
                created: false,
            });
        }

        // 2. New clinic
        let draft = NewClinic {
            email,
            tier: Tier::Free,
            ..cmd.registration
        };
        let clinic = match insert_clinic(self.clinics.as_ref(), &draft, Timestamp::now()).await {
            Ok(clinic) => clinic,
            // Another request created the account after step 1
            Err(SubscriptionError::EmailAlreadyRegistered) => {
                let clinic = self
                    .clinics
                    .find_by_email(&draft.email)
                    .await?
                    .ok_or(SubscriptionError::EmailAlreadyRegistered)?;
                return Ok(ProvisionedAccount {
                    clinic,
                    subscription: None,
                    created: false,
                });
            }
            Err(err) => return Err(err),
        };

        // 3. Trial, rolling back the clinic if it cannot be created
        let subscription = match self
            .create_trial
            .handle(CreateTrialCommand { clinic_id: clinic.id })
            .await
        {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!(clinic_id = %clinic.id, error = %err, "trial creation failed, removing clinic");
                if let Err(rollback) = self.clinics.delete(&clinic.id).await {
                    tracing::error!(clinic_id = %clinic.id, error = %rollback, "clinic rollback failed");
                }
                return Err(err);
            }
        };

        tracing::info!(clinic_id = %clinic.id, "trial account provisioned");
        Ok(ProvisionedAccount {
            clinic,
            subscription: Some(subscription),
            created: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryClinicRepository, InMemorySubscriptionLedger, InMemorySubscriptionRepository,
    };
    use crate::domain::clinic::LicenseKey;
    use crate::domain::foundation::{ClinicId, DomainError};
    use crate::ports::{SubscriptionLedger, SubscriptionRepository};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Hides existing clinics from the first email lookup, as if a parallel
    /// request inserted the row right after it.
    struct LateClinicRepository {
        inner: InMemoryClinicRepository,
        hide_next_lookup: AtomicBool,
    }

    #[async_trait]
    impl ClinicRepository for LateClinicRepository {
        async fn insert(&self, clinic: &Clinic) -> Result<(), DomainError> {
            self.inner.insert(clinic).await
        }

        async fn update(&self, clinic: &Clinic) -> Result<(), DomainError> {
            self.inner.update(clinic).await
        }

        async fn find_by_id(&self, id: &ClinicId) -> Result<Option<Clinic>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Clinic>, DomainError> {
            if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_email(email).await
        }

        async fn find_by_license_key(&self, key: &LicenseKey) -> Result<Option<Clinic>, DomainError> {
            self.inner.find_by_license_key(key).await
        }

        async fn delete(&self, id: &ClinicId) -> Result<(), DomainError> {
            self.inner.delete(id).await
        }
    }

    struct BrokenSubscriptionRepository;

    #[async_trait]
    impl SubscriptionRepository for BrokenSubscriptionRepository {
        async fn insert(&self, _s: &Subscription) -> Result<(), DomainError> {
            Err(DomainError::database("connection reset"))
        }

        async fn upsert(&self, _s: &Subscription) -> Result<(), DomainError> {
            Err(DomainError::database("connection reset"))
        }

        async fn update(&self, _s: &Subscription) -> Result<(), DomainError> {
            Err(DomainError::database("connection reset"))
        }

        async fn update_if_unchanged(&self, _s: &Subscription, _at: Timestamp) -> Result<bool, DomainError> {
            Err(DomainError::database("connection reset"))
        }

        async fn find_by_clinic(&self, _id: &ClinicId) -> Result<Option<Subscription>, DomainError> {
            Ok(None)
        }

        async fn find_due_changes(&self, _now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
            Ok(vec![])
        }
    }

    fn handler(
        clinics: Arc<InMemoryClinicRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> ProvisionTrialAccountHandler {
        let ledger: Arc<dyn SubscriptionLedger> = Arc::new(InMemorySubscriptionLedger::new());
        ProvisionTrialAccountHandler::new(clinics, CreateTrialHandler::new(subscriptions, ledger, 14))
    }

    fn command(email: &str) -> ProvisionTrialAccountCommand {
        ProvisionTrialAccountCommand {
            registration: NewClinic::from_email(email),
        }
    }

    #[tokio::test]
    async fn creates_clinic_and_trial() {
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let handler = handler(clinics.clone(), subscriptions.clone());

        let account = handler.handle(command(" Nova@Clinica.com.br")).await.unwrap();

        assert!(account.created);
        assert_eq!(account.clinic.email, "nova@clinica.com.br");
        assert_eq!(account.clinic.tier, Tier::Free);
        assert!(subscriptions.find_by_clinic(&account.clinic.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn existing_clinic_is_returned_unchanged() {
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let handler = handler(clinics.clone(), Arc::new(InMemorySubscriptionRepository::new()));
        let first = handler.handle(command("dra@clinica.com.br")).await.unwrap();

        let second = handler.handle(command("DRA@clinica.com.br")).await.unwrap();

        assert!(!second.created);
        assert!(second.subscription.is_none());
        assert_eq!(second.clinic.license_key, first.clinic.license_key);
        assert_eq!(clinics.len(), 1);
    }

    #[tokio::test]
    async fn losing_a_creation_race_returns_the_winner() {
        let clinics = Arc::new(LateClinicRepository {
            inner: InMemoryClinicRepository::new(),
            hide_next_lookup: AtomicBool::new(false),
        });
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let ledger: Arc<dyn SubscriptionLedger> = Arc::new(InMemorySubscriptionLedger::new());
        let handler = ProvisionTrialAccountHandler::new(
            clinics.clone(),
            CreateTrialHandler::new(subscriptions.clone(), ledger, 14),
        );
        let winner = handler.handle(command("dra@clinica.com.br")).await.unwrap();

        clinics.hide_next_lookup.store(true, Ordering::SeqCst);
        let loser = handler.handle(command("dra@clinica.com.br")).await.unwrap();

        assert!(!loser.created);
        assert!(loser.subscription.is_none());
        assert_eq!(loser.clinic.id, winner.clinic.id);
        assert_eq!(clinics.inner.len(), 1);
    }

    #[tokio::test]
    async fn clinic_is_removed_when_trial_fails() {
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let handler = handler(clinics.clone(), Arc::new(BrokenSubscriptionRepository));

        let err = handler.handle(command("dra@clinica.com.br")).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::Infrastructure(_)));
        assert!(clinics.is_empty());
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let handler = handler(clinics.clone(), Arc::new(InMemorySubscriptionRepository::new()));

        let err = handler.handle(command("not-an-email")).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::ValidationFailed { .. }));
        assert!(clinics.is_empty());
    }
}
