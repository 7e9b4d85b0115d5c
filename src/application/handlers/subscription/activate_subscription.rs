//! ActivateSubscriptionHandler - Applies a confirmed payment to a clinic.
//!
//! Keyed by clinic: an existing row of any status is overwritten, a clinic
//! without one gets a fresh active row. The clinic's denormalized tier is
//! rewritten in the same command.

use std::sync::Arc;

use crate::domain::clinic::Clinic;
use crate::domain::foundation::{ClinicId, SubscriptionId, Timestamp};
use crate::domain::subscription::{
    PaymentActivation, Subscription, SubscriptionError, SubscriptionEvent,
};
use crate::ports::{ClinicRepository, SubscriptionLedger, SubscriptionRepository};

use super::record_event;

#[derive(Debug, Clone)]
pub struct ActivateSubscriptionCommand {
    pub clinic_id: ClinicId,
    pub activation: PaymentActivation,
}

#[derive(Debug, Clone)]
pub struct ActivateSubscriptionResult {
    pub clinic: Clinic,
    pub subscription: Subscription,
}

pub struct ActivateSubscriptionHandler {
    clinics: Arc<dyn ClinicRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn SubscriptionLedger>,
}

impl ActivateSubscriptionHandler {
    pub fn new(
        clinics: Arc<dyn ClinicRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn SubscriptionLedger>,
    ) -> Self {
        Self {
            clinics,
            subscriptions,
            ledger,
        }
    }

    /// # Errors
    ///
    /// - `ClinicNotFound` if the payment references an unknown clinic
    pub async fn handle(
        &self,
        cmd: ActivateSubscriptionCommand,
    ) -> Result<ActivateSubscriptionResult, SubscriptionError> {
        let now = Timestamp::now();

        // 1. Resolve clinic
        let mut clinic = self
            .clinics
            .find_by_id(&cmd.clinic_id)
            .await?
            .ok_or(SubscriptionError::ClinicNotFound)?;

        // 2. Overwrite or create the subscription row
        let subscription = match self.subscriptions.find_by_clinic(&cmd.clinic_id).await? {
            Some(mut existing) => {
                existing.activate_from_payment(&cmd.activation, now)?;
                existing
            }
            None => Subscription::from_payment(SubscriptionId::new(), cmd.clinic_id, &cmd.activation, now),
        };
        self.subscriptions.upsert(&subscription).await?;

        // 3. Keep the clinic tier in sync
        clinic.set_tier(subscription.tier, now);
        self.clinics.update(&clinic).await?;

        // 4. Ledger
        record_event(
            self.ledger.as_ref(),
            SubscriptionEvent::activated(
                &subscription,
                cmd.activation.plan,
                &cmd.activation.payment_reference,
            ),
        )
        .await;

        tracing::info!(
            clinic_id = %cmd.clinic_id,
            tier = %subscription.tier,
            payment_id = %cmd.activation.payment_reference,
            "subscription activated"
        );

        Ok(ActivateSubscriptionResult {
            clinic,
            subscription,
        })
    }
}
