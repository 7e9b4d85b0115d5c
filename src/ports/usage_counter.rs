//! Usage counter port.
//!
//! One row per (clinic, UTC date). Increments must be atomic: concurrent
//! callers never lose an update.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{ClinicId, DomainError};
use crate::domain::usage::{UsageIncrement, UsageTotals};

#[async_trait]
pub trait UsageCounter: Send + Sync {
    /// Add to one counter for the day and return the day's totals after
    /// the increment.
    async fn increment(
        &self,
        clinic_id: &ClinicId,
        date: NaiveDate,
        increment: UsageIncrement,
    ) -> Result<UsageTotals, DomainError>;

    /// Totals for a single day; zeros when nothing was recorded.
    async fn daily(&self, clinic_id: &ClinicId, date: NaiveDate)
        -> Result<UsageTotals, DomainError>;

    /// Sum over `from..=to`.
    async fn total_between(
        &self,
        clinic_id: &ClinicId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<UsageTotals, DomainError>;
}
