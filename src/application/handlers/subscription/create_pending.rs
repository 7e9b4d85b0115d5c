//! CreatePendingHandler - Records a paid plan before its first payment clears.

use std::sync::Arc;

use crate::domain::foundation::{ClinicId, SubscriptionId, Timestamp};
use crate::domain::subscription::{
    PlanCode, PriceTable, Subscription, SubscriptionError, SubscriptionEvent,
};
use crate::ports::{SubscriptionLedger, SubscriptionRepository};

use super::record_event;

#[derive(Debug, Clone)]
pub struct CreatePendingCommand {
    pub clinic_id: ClinicId,
    pub plan: PlanCode,
}

pub struct CreatePendingHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn SubscriptionLedger>,
    prices: PriceTable,
}

impl CreatePendingHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn SubscriptionLedger>,
        prices: PriceTable,
    ) -> Self {
        Self {
            subscriptions,
            ledger,
            prices,
        }
    }

    /// # Errors
    ///
    /// - `InvalidPlan` if the price table has no price for the plan
    /// - `InvalidState` if the clinic already has a subscription
    pub async fn handle(&self, cmd: CreatePendingCommand) -> Result<Subscription, SubscriptionError> {
        // 1. Price the plan
        let amount = self
            .prices
            .price_for(cmd.plan)
            .ok_or_else(|| SubscriptionError::invalid_plan(cmd.plan.to_string()))?;

        // 2. Insert the pending row
        let subscription = Subscription::create_pending(
            SubscriptionId::new(),
            cmd.clinic_id,
            cmd.plan,
            amount,
            Timestamp::now(),
        );
        self.subscriptions.insert(&subscription).await?;

        // 3. Ledger
        record_event(
            self.ledger.as_ref(),
            SubscriptionEvent::pending_created(&subscription, cmd.plan),
        )
        .await;

        tracing::info!(clinic_id = %cmd.clinic_id, plan = %cmd.plan, "pending subscription created");
        Ok(subscription)
    }
}
