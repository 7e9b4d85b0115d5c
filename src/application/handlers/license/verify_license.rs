//! VerifyLicenseHandler - License check performed by the desktop client.
//!
//! Resolution order: clinic by key, subscription, lazy period-boundary
//! transition, status gate, entitlements, usage. A second call with no
//! intervening event returns the same answer and writes nothing.

use std::sync::Arc;

use crate::application::handlers::subscription::DueChangeApplier;
use crate::application::handlers::usage::usage_snapshot;
use crate::domain::clinic::Clinic;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    AppliedChange, EntitlementTable, Features, Subscription, SubscriptionError,
};
use crate::domain::usage::UsageSnapshot;
use crate::ports::{ClinicRepository, SubscriptionRepository, UsageCounter};

use super::clinic_for_key;

#[derive(Debug, Clone)]
pub struct VerifyLicenseCommand {
    pub license_key: String,
}

#[derive(Debug, Clone)]
pub struct VerifyLicenseResult {
    pub clinic: Clinic,
    pub subscription: Subscription,
    pub features: Features,
    pub usage: UsageSnapshot,
    /// Set when this call applied a scheduled change.
    pub applied_change: Option<AppliedChange>,
}

pub struct VerifyLicenseHandler {
    clinics: Arc<dyn ClinicRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    usage: Arc<dyn UsageCounter>,
    entitlements: EntitlementTable,
    applier: DueChangeApplier,
}

impl VerifyLicenseHandler {
    pub fn new(
        clinics: Arc<dyn ClinicRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        usage: Arc<dyn UsageCounter>,
        entitlements: EntitlementTable,
        applier: DueChangeApplier,
    ) -> Self {
        Self {
            clinics,
            subscriptions,
            usage,
            entitlements,
            applier,
        }
    }

    /// # Errors
    ///
    /// - `InvalidLicense` if no clinic holds the key
    /// - `NoSubscription` if the clinic has no subscription
    /// - `SubscriptionInactive` unless the status is active or trial
    pub async fn handle(
        &self,
        cmd: VerifyLicenseCommand,
    ) -> Result<VerifyLicenseResult, SubscriptionError> {
        let now = Timestamp::now();

        // 1. Resolve clinic
        let mut clinic = clinic_for_key(self.clinics.as_ref(), &cmd.license_key).await?;

        // 2. Resolve subscription
        let mut subscription = self
            .subscriptions
            .find_by_clinic(&clinic.id)
            .await?
            .ok_or(SubscriptionError::NoSubscription)?;

        // 3. Lazy transition
        let applied_change = self.applier.apply(&mut subscription, now).await?;
        if let Some(change) = &applied_change {
            clinic.set_tier(change.tier, now);
        }

        // 4. Status gate
        if !subscription.grants_access() {
            tracing::debug!(
                clinic_id = %clinic.id,
                status = %subscription.status,
                "license rejected: subscription inactive"
            );
            return Err(SubscriptionError::SubscriptionInactive(subscription.status));
        }

        // 5. Entitlements
        let features = self.entitlements.features(subscription.tier);

        // 6. Usage
        let usage = usage_snapshot(self.usage.as_ref(), &clinic.id, now.date()).await?;

        Ok(VerifyLicenseResult {
            clinic,
            subscription,
            features,
            usage,
            applied_change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryClinicRepository, InMemorySubscriptionLedger, InMemorySubscriptionRepository,
        InMemoryUsageCounter,
    };
    use crate::domain::clinic::{LicenseKey, NewClinic};
    use crate::domain::foundation::{ClinicId, Money, SubscriptionId};
    use crate::domain::subscription::{
        BillingCycle, PaymentActivation, PlanCode, SubscriptionStatus, Tier,
    };
    use crate::domain::usage::{UsageIncrement, UsageKind};

    struct Fixture {
        clinics: Arc<InMemoryClinicRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        usage: Arc<InMemoryUsageCounter>,
        ledger: Arc<InMemorySubscriptionLedger>,
        handler: VerifyLicenseHandler,
    }

    fn fixture() -> Fixture {
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let usage = Arc::new(InMemoryUsageCounter::new());
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let applier = DueChangeApplier::new(clinics.clone(), subscriptions.clone(), ledger.clone());
        let handler = VerifyLicenseHandler::new(
            clinics.clone(),
            subscriptions.clone(),
            usage.clone(),
            EntitlementTable::default(),
            applier,
        );
        Fixture {
            clinics,
            subscriptions,
            usage,
            ledger,
            handler,
        }
    }

    async fn seed(f: &Fixture, subscription: impl FnOnce(ClinicId) -> Subscription) -> Clinic {
        let clinic = Clinic::register(
            ClinicId::new(),
            &NewClinic::from_email("dra@clinica.com.br"),
            LicenseKey::generate(),
            Timestamp::now(),
        )
        .unwrap();
        f.clinics.insert(&clinic).await.unwrap();
        f.subscriptions.insert(&subscription(clinic.id)).await.unwrap();
        clinic
    }

    fn verify(clinic: &Clinic) -> VerifyLicenseCommand {
        VerifyLicenseCommand {
            license_key: clinic.license_key.to_string(),
        }
    }

    #[tokio::test]
    async fn trial_verifies_with_free_features_and_usage() {
        let f = fixture();
        let clinic = seed(&f, |id| {
            Subscription::create_trial(SubscriptionId::new(), id, 14, Timestamp::now())
        })
        .await;
        let today = Timestamp::now().date();
        f.usage
            .increment(&clinic.id, today, UsageIncrement::new(UsageKind::MessagesSent, 4).unwrap())
            .await
            .unwrap();

        let result = f.handler.handle(verify(&clinic)).await.unwrap();

        assert_eq!(result.subscription.tier, Tier::Free);
        assert_eq!(result.features, crate::domain::subscription::Features::free());
        assert_eq!(result.usage.today.messages_sent, 4);
        assert_eq!(result.usage.month_to_date.messages_sent, 4);
        assert!(result.applied_change.is_none());
    }

    #[tokio::test]
    async fn unknown_and_malformed_keys_are_invalid() {
        let f = fixture();

        let err = f
            .handler
            .handle(VerifyLicenseCommand {
                license_key: LicenseKey::generate().to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, SubscriptionError::InvalidLicense);

        let err = f
            .handler
            .handle(VerifyLicenseCommand {
                license_key: "garbage".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, SubscriptionError::InvalidLicense);
    }

    #[tokio::test]
    async fn blank_key_is_a_validation_error() {
        let f = fixture();
        let err = f
            .handler
            .handle(VerifyLicenseCommand {
                license_key: "  ".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), "License key required");
    }

    #[tokio::test]
    async fn clinic_without_subscription_is_rejected() {
        let f = fixture();
        let clinic = Clinic::register(
            ClinicId::new(),
            &NewClinic::from_email("sem@plano.com.br"),
            LicenseKey::generate(),
            Timestamp::now(),
        )
        .unwrap();
        f.clinics.insert(&clinic).await.unwrap();

        let err = f.handler.handle(verify(&clinic)).await.unwrap_err();
        assert_eq!(err, SubscriptionError::NoSubscription);
    }

    #[tokio::test]
    async fn pending_subscription_is_inactive() {
        let f = fixture();
        let clinic = seed(&f, |id| {
            Subscription::create_pending(
                SubscriptionId::new(),
                id,
                PlanCode::new(Tier::Pro, BillingCycle::Monthly).unwrap(),
                Money::from_reais(197.0),
                Timestamp::now(),
            )
        })
        .await;

        let err = f.handler.handle(verify(&clinic)).await.unwrap_err();

        assert_eq!(
            err,
            SubscriptionError::SubscriptionInactive(SubscriptionStatus::Pending)
        );
        assert_eq!(
            err.message(),
            "Subscription pending. Please activate your subscription."
        );
    }

    #[tokio::test]
    async fn due_downgrade_applies_once_then_gates() {
        let f = fixture();
        let clinic = seed(&f, |id| {
            let start = Timestamp::now().minus_days(35);
            let activation = PaymentActivation {
                plan: PlanCode::new(Tier::Pro, BillingCycle::Monthly).unwrap(),
                payment_reference: "mp-1".to_string(),
                paid_amount: Money::from_reais(197.0),
            };
            let mut sub = Subscription::from_payment(SubscriptionId::new(), id, &activation, start);
            sub.schedule_change(Tier::Free, None, start).unwrap();
            sub
        })
        .await;

        let err = f.handler.handle(verify(&clinic)).await.unwrap_err();
        assert_eq!(
            err,
            SubscriptionError::SubscriptionInactive(SubscriptionStatus::Cancelled)
        );

        let stored = f.subscriptions.find_by_clinic(&clinic.id).await.unwrap().unwrap();
        assert_eq!(stored.tier, Tier::Free);
        assert!(stored.next_tier.is_none());
        let stored_clinic = f.clinics.find_by_id(&clinic.id).await.unwrap().unwrap();
        assert_eq!(stored_clinic.tier, Tier::Free);
        assert_eq!(f.ledger.events().len(), 1);

        // second call: same answer, no new transition
        let again = f.handler.handle(verify(&clinic)).await.unwrap_err();
        assert_eq!(again, err);
        assert_eq!(f.ledger.events().len(), 1);
    }

    #[tokio::test]
    async fn due_upgrade_is_visible_immediately() {
        let f = fixture();
        let clinic = seed(&f, |id| {
            let mut sub = Subscription::create_trial(
                SubscriptionId::new(),
                id,
                14,
                Timestamp::now().minus_days(20),
            );
            sub.schedule_change(Tier::Premium, Some(BillingCycle::Yearly), Timestamp::now())
                .unwrap();
            sub
        })
        .await;

        let result = f.handler.handle(verify(&clinic)).await.unwrap();

        assert_eq!(result.subscription.tier, Tier::Premium);
        assert_eq!(result.subscription.status, SubscriptionStatus::Active);
        assert_eq!(result.clinic.tier, Tier::Premium);
        assert!(result.features.unlimited_messages());
        assert!(result.applied_change.is_some());
    }
}
