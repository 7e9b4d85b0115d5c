//! Usage handlers.
//!
//! ## Commands
//!
//! - `RecordUsageHandler` - Counter increment reported by the desktop client

mod record_usage;

// Commands
pub use record_usage::{RecordUsageCommand, RecordUsageHandler, RecordUsageResult};

use chrono::NaiveDate;

use crate::domain::foundation::{month_start, ClinicId, DomainError};
use crate::domain::usage::UsageSnapshot;
use crate::ports::UsageCounter;

/// Today's counters plus the sum from the first of the month through `today`.
pub(crate) async fn usage_snapshot(
    counter: &dyn UsageCounter,
    clinic_id: &ClinicId,
    today: NaiveDate,
) -> Result<UsageSnapshot, DomainError> {
    let daily = counter.daily(clinic_id, today).await?;
    let month_to_date = counter
        .total_between(clinic_id, month_start(today), today)
        .await?;
    Ok(UsageSnapshot {
        date: today,
        today: daily,
        month_to_date,
    })
}
