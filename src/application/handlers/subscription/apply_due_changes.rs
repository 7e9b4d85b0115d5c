//! Period-boundary transitions.
//!
//! `DueChangeApplier` is shared by license verification (lazy, one
//! subscription at a time) and `ApplyDueChangesHandler` (the interval
//! sweeper). Both go through `Subscription::apply_due_change`, so a change
//! applied by one is a no-op for the other.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    AppliedChange, Subscription, SubscriptionError, SubscriptionEvent,
};
use crate::ports::{ClinicRepository, SubscriptionLedger, SubscriptionRepository};

use super::record_event;

#[derive(Clone)]
pub struct DueChangeApplier {
    clinics: Arc<dyn ClinicRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn SubscriptionLedger>,
}

impl DueChangeApplier {
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

    /// Apply the queued change on `subscription` if its period has ended.
    /// Persists the row, rewrites the clinic tier and appends
    /// `change_applied`. Returns `None` without writing when nothing is due.
    ///
    /// The write only lands if the stored row is the one `subscription` was
    /// read from. If a payment or another transition changed it meanwhile,
    /// `subscription` is reloaded and nothing else is written.
    pub async fn apply(
        &self,
        subscription: &mut Subscription,
        now: Timestamp,
    ) -> Result<Option<AppliedChange>, SubscriptionError> {
        let read_at = subscription.updated_at;
        let Some(change) = subscription.apply_due_change(now)? else {
            return Ok(None);
        };

        if !self
            .subscriptions
            .update_if_unchanged(subscription, read_at)
            .await?
        {
            tracing::info!(
                clinic_id = %subscription.clinic_id,
                "subscription changed since it was read, scheduled change skipped"
            );
            match self.subscriptions.find_by_clinic(&subscription.clinic_id).await? {
                Some(current) => *subscription = current,
                None => return Err(SubscriptionError::NoSubscription),
            }
            return Ok(None);
        }

        match self.clinics.find_by_id(&subscription.clinic_id).await? {
            Some(mut clinic) => {
                clinic.set_tier(change.tier, now);
                self.clinics.update(&clinic).await?;
            }
            None => tracing::warn!(
                clinic_id = %subscription.clinic_id,
                "subscription changed for a clinic that no longer exists"
            ),
        }

        record_event(
            self.ledger.as_ref(),
            SubscriptionEvent::change_applied(subscription, &change),
        )
        .await;

        tracing::info!(
            clinic_id = %subscription.clinic_id,
            from_tier = %change.previous_tier,
            tier = %change.tier,
            status = %change.status,
            "scheduled subscription change applied"
        );
        Ok(Some(change))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyDueChangesResult {
    pub applied: usize,
    pub failed: usize,
}

/// Sweeps every subscription with a due change. One failure does not stop
/// the sweep.
pub struct ApplyDueChangesHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    applier: DueChangeApplier,
}

impl ApplyDueChangesHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, applier: DueChangeApplier) -> Self {
        Self {
            subscriptions,
            applier,
        }
    }

    pub async fn handle(&self, now: Timestamp) -> Result<ApplyDueChangesResult, SubscriptionError> {
        let due = self.subscriptions.find_due_changes(now).await?;
        let mut result = ApplyDueChangesResult::default();

        for mut subscription in due {
            match self.applier.apply(&mut subscription, now).await {
                Ok(Some(_)) => result.applied += 1,
                Ok(None) => {}
                Err(err) => {
                    result.failed += 1;
                    tracing::error!(
                        clinic_id = %subscription.clinic_id,
                        error = %err,
                        "failed to apply scheduled change"
                    );
                }
            }
        }

        if result.applied > 0 || result.failed > 0 {
            tracing::info!(applied = result.applied, failed = result.failed, "due-change sweep finished");
        }
        Ok(result)
    }
}
