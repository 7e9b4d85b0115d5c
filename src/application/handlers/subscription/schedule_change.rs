//! ScheduleChangeHandler - Queues a tier change for the next period boundary.

use std::sync::Arc;

use crate::domain::foundation::{ClinicId, Timestamp};
use crate::domain::subscription::{
    BillingCycle, Subscription, SubscriptionError, SubscriptionEvent, Tier,
};
use crate::ports::{SubscriptionLedger, SubscriptionRepository};

use super::record_event;

#[derive(Debug, Clone)]
pub struct ScheduleChangeCommand {
    pub clinic_id: ClinicId,
    pub next_tier: Tier,
    /// Defaults to monthly.
    pub next_billing_cycle: Option<BillingCycle>,
}

pub struct ScheduleChangeHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn SubscriptionLedger>,
}

impl ScheduleChangeHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn SubscriptionLedger>,
    ) -> Self {
        Self {
            subscriptions,
            ledger,
        }
    }

    /// # Errors
    ///
    /// - `NoSubscription` if the clinic has no subscription
    /// - `InvalidState` unless the subscription is active or trial
    pub async fn handle(&self, cmd: ScheduleChangeCommand) -> Result<Subscription, SubscriptionError> {
        let mut subscription = self
            .subscriptions
            .find_by_clinic(&cmd.clinic_id)
            .await?
            .ok_or(SubscriptionError::NoSubscription)?;

        subscription.schedule_change(cmd.next_tier, cmd.next_billing_cycle, Timestamp::now())?;
        self.subscriptions.update(&subscription).await?;

        record_event(
            self.ledger.as_ref(),
            SubscriptionEvent::change_scheduled(&subscription, cmd.next_tier),
        )
        .await;

        tracing::info!(
            clinic_id = %cmd.clinic_id,
            next_tier = %cmd.next_tier,
            "subscription change scheduled"
        );
        Ok(subscription)
    }
}
