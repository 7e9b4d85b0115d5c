//! Subscription ledger events.
//!
//! Appended alongside every write to the subscription row so billing
//! history survives the row being overwritten. Events are named in past
//! tense.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClinicId, Money, SubscriptionId, Timestamp};

use super::{AppliedChange, BillingCycle, PlanCode, Subscription, SubscriptionStatus, Tier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubscriptionEvent {
    TrialStarted {
        subscription_id: SubscriptionId,
        clinic_id: ClinicId,
        period_end: Option<Timestamp>,
        occurred_at: Timestamp,
    },

    PendingCreated {
        subscription_id: SubscriptionId,
        clinic_id: ClinicId,
        plan: PlanCode,
        amount: Money,
        occurred_at: Timestamp,
    },

    Activated {
        subscription_id: SubscriptionId,
        clinic_id: ClinicId,
        plan: PlanCode,
        payment_reference: String,
        amount: Money,
        period_end: Option<Timestamp>,
        occurred_at: Timestamp,
    },

    ChangeScheduled {
        subscription_id: SubscriptionId,
        clinic_id: ClinicId,
        next_tier: Tier,
        next_billing_cycle: Option<BillingCycle>,
        cancel_at_period_end: bool,
        occurred_at: Timestamp,
    },

    ChangeApplied {
        subscription_id: SubscriptionId,
        clinic_id: ClinicId,
        from_tier: Tier,
        to_tier: Tier,
        status: SubscriptionStatus,
        period_end: Timestamp,
        occurred_at: Timestamp,
    },
}

impl SubscriptionEvent {
    pub fn trial_started(sub: &Subscription) -> Self {
        SubscriptionEvent::TrialStarted {
            subscription_id: sub.id,
            clinic_id: sub.clinic_id,
            period_end: sub.current_period_end,
            occurred_at: sub.updated_at,
        }
    }

    pub fn pending_created(sub: &Subscription, plan: PlanCode) -> Self {
        SubscriptionEvent::PendingCreated {
            subscription_id: sub.id,
            clinic_id: sub.clinic_id,
            plan,
            amount: sub.amount,
            occurred_at: sub.updated_at,
        }
    }

    pub fn activated(sub: &Subscription, plan: PlanCode, payment_reference: &str) -> Self {
        SubscriptionEvent::Activated {
            subscription_id: sub.id,
            clinic_id: sub.clinic_id,
            plan,
            payment_reference: payment_reference.to_string(),
            amount: sub.amount,
            period_end: sub.current_period_end,
            occurred_at: sub.updated_at,
        }
    }

    pub fn change_scheduled(sub: &Subscription, next_tier: Tier) -> Self {
        SubscriptionEvent::ChangeScheduled {
            subscription_id: sub.id,
            clinic_id: sub.clinic_id,
            next_tier,
            next_billing_cycle: sub.next_billing_cycle,
            cancel_at_period_end: sub.cancel_at_period_end,
            occurred_at: sub.updated_at,
        }
    }

    pub fn change_applied(sub: &Subscription, change: &AppliedChange) -> Self {
        SubscriptionEvent::ChangeApplied {
            subscription_id: sub.id,
            clinic_id: sub.clinic_id,
            from_tier: change.previous_tier,
            to_tier: change.tier,
            status: change.status,
            period_end: change.period_end,
            occurred_at: change.period_start,
        }
    }

    pub fn clinic_id(&self) -> ClinicId {
        match self {
            SubscriptionEvent::TrialStarted { clinic_id, .. }
            | SubscriptionEvent::PendingCreated { clinic_id, .. }
            | SubscriptionEvent::Activated { clinic_id, .. }
            | SubscriptionEvent::ChangeScheduled { clinic_id, .. }
            | SubscriptionEvent::ChangeApplied { clinic_id, .. } => *clinic_id,
        }
    }

    pub fn occurred_at(&self) -> Timestamp {
        match self {
            SubscriptionEvent::TrialStarted { occurred_at, .. }
            | SubscriptionEvent::PendingCreated { occurred_at, .. }
            | SubscriptionEvent::Activated { occurred_at, .. }
            | SubscriptionEvent::ChangeScheduled { occurred_at, .. }
            | SubscriptionEvent::ChangeApplied { occurred_at, .. } => *occurred_at,
        }
    }

    /// Stored `kind` column value.
    pub fn kind(&self) -> &'static str {
        match self {
            SubscriptionEvent::TrialStarted { .. } => "trial_started",
            SubscriptionEvent::PendingCreated { .. } => "pending_created",
            SubscriptionEvent::Activated { .. } => "activated",
            SubscriptionEvent::ChangeScheduled { .. } => "change_scheduled",
            SubscriptionEvent::ChangeApplied { .. } => "change_applied",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let sub = Subscription::create_trial(
            SubscriptionId::new(),
            ClinicId::new(),
            14,
            Timestamp::now(),
        );
        let event = SubscriptionEvent::trial_started(&sub);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], event.kind());
        assert_eq!(json["clinic_id"], sub.clinic_id.to_string());

        let back: SubscriptionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn activated_event_carries_plan_code() {
        let plan = PlanCode::new(Tier::Pro, BillingCycle::Yearly).unwrap();
        let sub = Subscription::create_pending(
            SubscriptionId::new(),
            ClinicId::new(),
            plan,
            Money::from_reais(2127.0),
            Timestamp::now(),
        );
        let event = SubscriptionEvent::activated(&sub, plan, "mp-42");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["plan"], "PRO_yearly");
        assert_eq!(json["payment_reference"], "mp-42");
        assert_eq!(event.clinic_id(), sub.clinic_id);
    }
}
