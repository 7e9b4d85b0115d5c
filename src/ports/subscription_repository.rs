//! Subscription persistence and the append-only subscription ledger.

use async_trait::async_trait;

use crate::domain::foundation::{ClinicId, DomainError, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionEvent};

/// Repository port for the one-row-per-clinic subscription record.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a subscription for a clinic that has none.
    ///
    /// # Errors
    ///
    /// - `SubscriptionAlreadyExists` if the clinic already has one
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Insert or replace the clinic's subscription. Last write wins.
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the clinic has no subscription
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Write `subscription` only if the stored row still carries
    /// `expected_updated_at`. Returns `false` when another writer got there
    /// first or the row is gone.
    async fn update_if_unchanged(
        &self,
        subscription: &Subscription,
        expected_updated_at: Timestamp,
    ) -> Result<bool, DomainError>;

    async fn find_by_clinic(&self, clinic_id: &ClinicId)
        -> Result<Option<Subscription>, DomainError>;

    /// Subscriptions with a scheduled change whose period ended before `now`.
    async fn find_due_changes(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError>;
}

/// Append-only history of subscription mutations.
#[async_trait]
pub trait SubscriptionLedger: Send + Sync {
    async fn append(&self, event: &SubscriptionEvent) -> Result<(), DomainError>;

    /// Events for one clinic, oldest first.
    async fn history(&self, clinic_id: &ClinicId) -> Result<Vec<SubscriptionEvent>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }

    #[test]
    fn subscription_ledger_is_object_safe() {
        fn _accepts_dyn(_ledger: &dyn SubscriptionLedger) {}
    }
}
