//! Subscription aggregate.
//!
//! One mutable row per clinic. Every mutation here is mirrored into the
//! append-only ledger by the application layer (see [`super::SubscriptionEvent`]).
//!
//! # Invariants
//!
//! - `clinic_id` is unique across subscriptions
//! - `status == Active` implies `current_period_end` is `None` or in the
//!   future, except between a period boundary and the next transition check
//! - `next_tier` is only acted on while the status grants access

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ClinicId, DomainError, ErrorCode, Money, StateMachine, SubscriptionId, Timestamp,
};

use super::{BillingCycle, PlanCode, SubscriptionStatus, Tier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub clinic_id: ClinicId,
    pub tier: Tier,
    pub status: SubscriptionStatus,
    pub billing_cycle: Option<BillingCycle>,
    pub amount: Money,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub next_tier: Option<Tier>,
    pub next_billing_cycle: Option<BillingCycle>,
    pub cancel_at_period_end: bool,
    /// Payment provider's id for the payment that activated this period.
    pub payment_reference: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An approved payment resolved to a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentActivation {
    pub plan: PlanCode,
    pub payment_reference: String,
    pub paid_amount: Money,
}

/// Outcome of applying a scheduled change at a period boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub previous_tier: Tier,
    pub tier: Tier,
    pub billing_cycle: Option<BillingCycle>,
    pub status: SubscriptionStatus,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
}

impl Subscription {
    /// FREE trial: active immediately, zero amount, `trial_days` long.
    pub fn create_trial(
        id: SubscriptionId,
        clinic_id: ClinicId,
        trial_days: u32,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            clinic_id,
            tier: Tier::Free,
            status: SubscriptionStatus::Active,
            billing_cycle: Some(BillingCycle::Trial),
            amount: Money::ZERO,
            current_period_start: Some(now),
            current_period_end: Some(now.add_days(i64::from(trial_days))),
            next_tier: None,
            next_billing_cycle: None,
            cancel_at_period_end: false,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Paid plan chosen before payment clears. No period until activation.
    pub fn create_pending(
        id: SubscriptionId,
        clinic_id: ClinicId,
        plan: PlanCode,
        amount: Money,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            clinic_id,
            tier: plan.tier(),
            status: SubscriptionStatus::Pending,
            billing_cycle: Some(plan.cycle()),
            amount,
            current_period_start: None,
            current_period_end: None,
            next_tier: None,
            next_billing_cycle: None,
            cancel_at_period_end: false,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Row for a clinic whose first record is a confirmed payment.
    pub fn from_payment(
        id: SubscriptionId,
        clinic_id: ClinicId,
        activation: &PaymentActivation,
        now: Timestamp,
    ) -> Self {
        let cycle = activation.plan.cycle();
        Self {
            id,
            clinic_id,
            tier: activation.plan.tier(),
            status: SubscriptionStatus::Active,
            billing_cycle: Some(cycle),
            amount: activation.paid_amount,
            current_period_start: Some(now),
            current_period_end: Some(cycle.period_end_from(now)),
            next_tier: None,
            next_billing_cycle: None,
            cancel_at_period_end: false,
            payment_reference: Some(activation.payment_reference.clone()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite billing state with a confirmed payment. A second payment
    /// restarts the period at `now` rather than extending it.
    pub fn activate_from_payment(
        &mut self,
        activation: &PaymentActivation,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        let cycle = activation.plan.cycle();
        self.tier = activation.plan.tier();
        self.billing_cycle = Some(cycle);
        self.amount = activation.paid_amount;
        self.current_period_start = Some(now);
        self.current_period_end = Some(cycle.period_end_from(now));
        self.next_tier = None;
        self.next_billing_cycle = None;
        self.cancel_at_period_end = false;
        self.payment_reference = Some(activation.payment_reference.clone());
        self.updated_at = now;
        Ok(())
    }

    /// Queue a tier change for the next period boundary. Current
    /// entitlements are untouched.
    pub fn schedule_change(
        &mut self,
        next_tier: Tier,
        next_cycle: Option<BillingCycle>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if !self.status.grants_access() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot schedule a change on a {} subscription", self.status),
            ));
        }

        let cycle = next_cycle.unwrap_or(BillingCycle::Monthly);
        if !cycle.is_billable() {
            return Err(DomainError::validation(
                "new_billing_cycle",
                format!("'{}' cannot be scheduled", cycle),
            ));
        }

        self.next_tier = Some(next_tier);
        self.next_billing_cycle = Some(cycle);
        self.cancel_at_period_end = next_tier == Tier::Free;
        self.updated_at = now;
        Ok(())
    }

    /// True when the period has ended and a queued change is waiting.
    pub fn is_change_due(&self, now: Timestamp) -> bool {
        self.status.grants_access()
            && self.next_tier.is_some()
            && self
                .current_period_end
                .is_some_and(|end| end.is_before(&now))
    }

    /// Apply the queued change if it is due. Returns `None` when nothing was
    /// due, so calling this repeatedly is safe.
    pub fn apply_due_change(
        &mut self,
        now: Timestamp,
    ) -> Result<Option<AppliedChange>, DomainError> {
        if !self.is_change_due(now) {
            return Ok(None);
        }
        let Some(next_tier) = self.next_tier else {
            return Ok(None);
        };

        let next_status = if next_tier == Tier::Free {
            SubscriptionStatus::Cancelled
        } else {
            SubscriptionStatus::Active
        };
        self.transition_to(next_status)?;

        let previous_tier = self.tier;
        let cycle = self.next_billing_cycle;
        let period_end = cycle
            .unwrap_or(BillingCycle::Monthly)
            .period_end_from(now);

        self.tier = next_tier;
        self.billing_cycle = cycle;
        self.current_period_start = Some(now);
        self.current_period_end = Some(period_end);
        self.next_tier = None;
        self.next_billing_cycle = None;
        self.updated_at = now;

        Ok(Some(AppliedChange {
            previous_tier,
            tier: next_tier,
            billing_cycle: cycle,
            status: next_status,
            period_start: now,
            period_end,
        }))
    }

    pub fn grants_access(&self) -> bool {
        self.status.grants_access()
    }

    /// Whole days left in the current period; `None` for open-ended rows.
    pub fn days_remaining(&self, now: Timestamp) -> Option<u32> {
        self.current_period_end.map(|end| {
            if end.is_after(&now) {
                end.duration_since(&now).num_days().max(0) as u32
            } else {
                0
            }
        })
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {} to {}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pro_monthly() -> PlanCode {
        PlanCode::new(Tier::Pro, BillingCycle::Monthly).unwrap()
    }

    fn premium_yearly() -> PlanCode {
        PlanCode::new(Tier::Premium, BillingCycle::Yearly).unwrap()
    }

    fn trial(now: Timestamp) -> Subscription {
        Subscription::create_trial(SubscriptionId::new(), ClinicId::new(), 14, now)
    }

    fn activation(plan: PlanCode, amount: f64) -> PaymentActivation {
        PaymentActivation {
            plan,
            payment_reference: "pay_123".to_string(),
            paid_amount: Money::from_reais(amount),
        }
    }

    // Construction

    #[test]
    fn trial_is_active_free_for_fourteen_days() {
        let now = Timestamp::now();
        let sub = trial(now);

        assert_eq!(sub.tier, Tier::Free);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.billing_cycle, Some(BillingCycle::Trial));
        assert!(sub.amount.is_zero());
        assert_eq!(sub.current_period_end, Some(now.add_days(14)));
        assert_eq!(sub.days_remaining(now), Some(14));
    }

    #[test]
    fn pending_has_no_period() {
        let sub = Subscription::create_pending(
            SubscriptionId::new(),
            ClinicId::new(),
            premium_yearly(),
            Money::from_reais(5367.0),
            Timestamp::now(),
        );

        assert_eq!(sub.status, SubscriptionStatus::Pending);
        assert_eq!(sub.tier, Tier::Premium);
        assert!(sub.current_period_start.is_none());
        assert!(sub.current_period_end.is_none());
        assert!(!sub.grants_access());
    }

    // Activation

    #[test]
    fn activation_clears_scheduled_change() {
        let now = Timestamp::now();
        let mut sub = trial(now);
        sub.schedule_change(Tier::Free, None, now).unwrap();

        sub.activate_from_payment(&activation(pro_monthly(), 197.0), now)
            .unwrap();

        assert_eq!(sub.tier, Tier::Pro);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.amount, Money::from_reais(197.0));
        assert!(sub.next_tier.is_none());
        assert!(sub.next_billing_cycle.is_none());
        assert!(!sub.cancel_at_period_end);
        assert_eq!(sub.current_period_end, Some(now.add_months(1)));
        assert_eq!(sub.payment_reference.as_deref(), Some("pay_123"));
    }

    #[test]
    fn second_payment_restarts_period() {
        let first = Timestamp::now();
        let mut sub = trial(first);
        sub.activate_from_payment(&activation(premium_yearly(), 5367.0), first)
            .unwrap();

        let later = first.add_days(100);
        sub.activate_from_payment(&activation(premium_yearly(), 5367.0), later)
            .unwrap();

        assert_eq!(sub.current_period_start, Some(later));
        assert_eq!(sub.current_period_end, Some(later.add_years(1)));
    }

    #[test]
    fn cancelled_subscription_can_be_reactivated() {
        let mut sub = trial(Timestamp::now());
        sub.status = SubscriptionStatus::Cancelled;

        assert!(sub
            .activate_from_payment(&activation(pro_monthly(), 197.0), Timestamp::now())
            .is_ok());
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    // Scheduling

    #[test]
    fn schedule_downgrade_to_free_sets_cancel_flag() {
        let now = Timestamp::now();
        let mut sub = trial(now);
        sub.schedule_change(Tier::Free, None, now).unwrap();

        assert_eq!(sub.next_tier, Some(Tier::Free));
        assert_eq!(sub.next_billing_cycle, Some(BillingCycle::Monthly));
        assert!(sub.cancel_at_period_end);
        // current entitlements unchanged
        assert_eq!(sub.tier, Tier::Free);
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn schedule_paid_change_keeps_cancel_flag_off() {
        let now = Timestamp::now();
        let mut sub = Subscription::from_payment(
            SubscriptionId::new(),
            ClinicId::new(),
            &activation(premium_yearly(), 5367.0),
            now,
        );
        sub.schedule_change(Tier::Pro, Some(BillingCycle::Yearly), now)
            .unwrap();

        assert_eq!(sub.next_tier, Some(Tier::Pro));
        assert_eq!(sub.next_billing_cycle, Some(BillingCycle::Yearly));
        assert!(!sub.cancel_at_period_end);
        assert_eq!(sub.tier, Tier::Premium);
    }

    #[test]
    fn schedule_rejected_for_pending() {
        let mut sub = Subscription::create_pending(
            SubscriptionId::new(),
            ClinicId::new(),
            pro_monthly(),
            Money::from_reais(197.0),
            Timestamp::now(),
        );
        let err = sub
            .schedule_change(Tier::Free, None, Timestamp::now())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn schedule_rejects_trial_cycle() {
        let mut sub = trial(Timestamp::now());
        let err = sub
            .schedule_change(Tier::Pro, Some(BillingCycle::Trial), Timestamp::now())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    // Lazy transition

    #[test]
    fn due_downgrade_to_free_cancels() {
        let start = Timestamp::now().minus_days(31);
        let mut sub = Subscription::from_payment(
            SubscriptionId::new(),
            ClinicId::new(),
            &activation(pro_monthly(), 197.0),
            start,
        );
        sub.current_period_end = Some(Timestamp::now().minus_days(1));
        sub.schedule_change(Tier::Free, None, start).unwrap();

        let now = Timestamp::now();
        let applied = sub.apply_due_change(now).unwrap().unwrap();

        assert_eq!(applied.previous_tier, Tier::Pro);
        assert_eq!(applied.tier, Tier::Free);
        assert_eq!(applied.status, SubscriptionStatus::Cancelled);
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert_eq!(sub.tier, Tier::Free);
        assert!(sub.next_tier.is_none());
        assert_eq!(sub.current_period_start, Some(now));
        assert_eq!(sub.current_period_end, Some(now.add_months(1)));
    }

    #[test]
    fn due_change_applies_exactly_once() {
        let mut sub = trial(Timestamp::now().minus_days(20));
        sub.schedule_change(Tier::Pro, Some(BillingCycle::Yearly), Timestamp::now())
            .unwrap();

        let now = Timestamp::now();
        let applied = sub.apply_due_change(now).unwrap().unwrap();
        assert_eq!(applied.status, SubscriptionStatus::Active);
        assert_eq!(sub.current_period_end, Some(now.add_years(1)));

        let snapshot = sub.clone();
        assert!(sub.apply_due_change(now.plus_secs(5)).unwrap().is_none());
        assert_eq!(sub, snapshot);
    }

    #[test]
    fn change_not_due_before_period_end() {
        let now = Timestamp::now();
        let mut sub = trial(now);
        sub.schedule_change(Tier::Pro, None, now).unwrap();

        assert!(!sub.is_change_due(now));
        assert!(sub.apply_due_change(now).unwrap().is_none());
        assert_eq!(sub.next_tier, Some(Tier::Pro));
    }

    #[test]
    fn expired_period_without_queued_change_is_left_alone() {
        let mut sub = trial(Timestamp::now().minus_days(30));
        assert!(sub.apply_due_change(Timestamp::now()).unwrap().is_none());
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn queued_change_ignored_once_access_is_gone() {
        let mut sub = trial(Timestamp::now().minus_days(30));
        sub.next_tier = Some(Tier::Pro);
        sub.status = SubscriptionStatus::Expired;

        assert!(!sub.is_change_due(Timestamp::now()));
    }
}
