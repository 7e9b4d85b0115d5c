//! Subscription status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Billing status of a clinic's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Paid plan chosen at signup, waiting for the first payment.
    Pending,
    Active,
    /// Legacy trial rows. New trials are `Active` with a trial cycle.
    Trial,
    /// A scheduled downgrade to FREE has taken effect.
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn parse(raw: &str) -> Option<SubscriptionStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(SubscriptionStatus::Pending),
            "active" => Some(SubscriptionStatus::Active),
            "trial" => Some(SubscriptionStatus::Trial),
            "cancelled" | "canceled" => Some(SubscriptionStatus::Cancelled),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    /// Active and trial subscriptions pass license verification.
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trial)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // payment activation is an upsert and may land on any row
            (_, Active)
                | (Pending, Cancelled)
                | (Pending, Expired)
                | (Trial, Cancelled)
                | (Trial, Expired)
                | (Active, Cancelled)
                | (Active, Expired)
                | (Expired, Pending)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active, Cancelled, Expired],
            Trial => vec![Active, Cancelled, Expired],
            Active => vec![Active, Cancelled, Expired],
            Cancelled => vec![Active],
            Expired => vec![Active, Pending],
        }
    }
}
