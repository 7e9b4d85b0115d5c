//! In-memory adapters.
//!
//! Mutex-guarded implementations of every storage port plus canned
//! integrations. They back the test suite and `features.in_memory_storage`
//! mode. Nothing survives a restart.

mod admin;
mod billing;
mod funnel;
mod integrations;
mod usage;

pub use admin::InMemoryAdminUserRepository;
pub use billing::{InMemoryClinicRepository, InMemorySubscriptionLedger, InMemorySubscriptionRepository};
pub use funnel::InMemoryFunnelStore;
pub use integrations::{RecordingEmailSender, StaticMessageDrafter, StaticPaymentGateway};
pub use usage::InMemoryUsageCounter;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock that keeps working after a panicking holder; the guarded maps stay
/// structurally valid either way.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
