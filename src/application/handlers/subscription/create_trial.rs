//! CreateTrialHandler - Starts the FREE trial for a clinic.

use std::sync::Arc;

use crate::domain::foundation::{ClinicId, SubscriptionId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionError, SubscriptionEvent};
use crate::ports::{SubscriptionLedger, SubscriptionRepository};

use super::record_event;

#[derive(Debug, Clone)]
pub struct CreateTrialCommand {
    pub clinic_id: ClinicId,
}

pub struct CreateTrialHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn SubscriptionLedger>,
    trial_days: u32,
}

impl CreateTrialHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn SubscriptionLedger>,
        trial_days: u32,
    ) -> Self {
        Self {
            subscriptions,
            ledger,
            trial_days,
        }
    }

    /// # Errors
    ///
    /// - `InvalidState` if the clinic already has a subscription
    pub async fn handle(&self, cmd: CreateTrialCommand) -> Result<Subscription, SubscriptionError> {
        let now = Timestamp::now();
        let subscription =
            Subscription::create_trial(SubscriptionId::new(), cmd.clinic_id, self.trial_days, now);

        self.subscriptions.insert(&subscription).await?;
        record_event(
            self.ledger.as_ref(),
            SubscriptionEvent::trial_started(&subscription),
        )
        .await;

        tracing::info!(clinic_id = %cmd.clinic_id, days = self.trial_days, "trial started");
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySubscriptionLedger, InMemorySubscriptionRepository};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::domain::subscription::{BillingCycle, SubscriptionStatus, Tier};
    use async_trait::async_trait;

    struct FailingLedger;

    #[async_trait]
    impl SubscriptionLedger for FailingLedger {
        async fn append(&self, _event: &SubscriptionEvent) -> Result<(), DomainError> {
            Err(DomainError::database("ledger offline"))
        }

        async fn history(&self, _clinic_id: &ClinicId) -> Result<Vec<SubscriptionEvent>, DomainError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn creates_active_free_trial() {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = CreateTrialHandler::new(subscriptions.clone(), ledger.clone(), 14);
        let clinic_id = ClinicId::new();

        let sub = handler.handle(CreateTrialCommand { clinic_id }).await.unwrap();

        assert_eq!(sub.tier, Tier::Free);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.billing_cycle, Some(BillingCycle::Trial));
        assert!(subscriptions.find_by_clinic(&clinic_id).await.unwrap().is_some());

        let events = ledger.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "trial_started");
    }

    #[tokio::test]
    async fn trial_length_comes_from_configuration() {
        let handler = CreateTrialHandler::new(
            Arc::new(InMemorySubscriptionRepository::new()),
            Arc::new(InMemorySubscriptionLedger::new()),
            30,
        );

        let sub = handler
            .handle(CreateTrialCommand { clinic_id: ClinicId::new() })
            .await
            .unwrap();

        let start = sub.current_period_start.unwrap();
        assert_eq!(sub.current_period_end, Some(start.add_days(30)));
    }

    #[tokio::test]
    async fn second_trial_conflicts() {
        let handler = CreateTrialHandler::new(
            Arc::new(InMemorySubscriptionRepository::new()),
            Arc::new(InMemorySubscriptionLedger::new()),
            14,
        );
        let clinic_id = ClinicId::new();
        handler.handle(CreateTrialCommand { clinic_id }).await.unwrap();

        let err = handler.handle(CreateTrialCommand { clinic_id }).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::InvalidState(_)));
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn ledger_failure_does_not_fail_command() {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let handler = CreateTrialHandler::new(subscriptions.clone(), Arc::new(FailingLedger), 14);
        let clinic_id = ClinicId::new();

        assert!(handler.handle(CreateTrialCommand { clinic_id }).await.is_ok());
        assert!(subscriptions.find_by_clinic(&clinic_id).await.unwrap().is_some());
    }
}
