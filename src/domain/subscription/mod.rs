//! Subscription domain: tiers, plans, entitlements and the per-clinic
//! billing record with its lifecycle.

mod aggregate;
mod billing_cycle;
mod errors;
mod events;
mod features;
mod plan;
mod status;
mod tier;

pub use aggregate::{AppliedChange, PaymentActivation, Subscription};
pub use billing_cycle::BillingCycle;
pub use errors::SubscriptionError;
pub use events::SubscriptionEvent;
pub use features::{EntitlementTable, Features};
pub use plan::{CheckoutLinks, PlanCode, PriceTable};
pub use status::SubscriptionStatus;
pub use tier::Tier;
