//! Usage counters reported by the desktop client.

mod counters;

pub use counters::{
    UsageIncrement, UsageKind, UsageRecord, UsageSnapshot, UsageTotals, MAX_INCREMENT,
};
