//! Subscription lifecycle handlers.
//!
//! ## Commands
//!
//! - `CreateTrialHandler` - FREE trial for a new clinic
//! - `CreatePendingHandler` - Paid plan awaiting its first payment
//! - `ActivateSubscriptionHandler` - Confirmed payment, upsert by clinic
//! - `ScheduleChangeHandler` - Tier change at the next period boundary
//! - `ApplyDueChangesHandler` - Sweep every subscription whose change is due
//! - `ManageSubscriptionHandler` - Self-service info and downgrade
//!
//! Every row mutation is followed by an append to the subscription ledger.
//! The row is the source of truth, so a ledger failure is logged and the
//! command still succeeds.

mod activate_subscription;
mod apply_due_changes;
mod create_pending;
mod create_trial;
mod manage_subscription;
mod schedule_change;

// Commands
pub use activate_subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, ActivateSubscriptionResult,
};
pub use apply_due_changes::{ApplyDueChangesHandler, ApplyDueChangesResult, DueChangeApplier};
pub use create_pending::{CreatePendingCommand, CreatePendingHandler};
pub use create_trial::{CreateTrialCommand, CreateTrialHandler};
pub use manage_subscription::{
    ManageAction, ManageSubscriptionCommand, ManageSubscriptionHandler, ManageSubscriptionResult,
    SubscriptionInfo,
};
pub use schedule_change::{ScheduleChangeCommand, ScheduleChangeHandler};

use crate::domain::subscription::SubscriptionEvent;
use crate::ports::SubscriptionLedger;

pub(crate) async fn record_event(ledger: &dyn SubscriptionLedger, event: SubscriptionEvent) {
    if let Err(err) = ledger.append(&event).await {
        tracing::warn!(
            clinic_id = %event.clinic_id(),
            kind = event.kind(),
            error = %err,
            "failed to append subscription event"
        );
    }
}
