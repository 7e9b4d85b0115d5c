//! Daily usage counters.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{ClinicId, DomainError};
use crate::domain::usage::{UsageIncrement, UsageTotals};
use crate::ports::UsageCounter;

use super::lock;

/// Increments happen under one mutex, so concurrent callers never lose
/// an update.
#[derive(Default)]
pub struct InMemoryUsageCounter {
    rows: Mutex<HashMap<(ClinicId, NaiveDate), UsageTotals>>,
}

impl InMemoryUsageCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageCounter for InMemoryUsageCounter {
    async fn increment(
        &self,
        clinic_id: &ClinicId,
        date: NaiveDate,
        increment: UsageIncrement,
    ) -> Result<UsageTotals, DomainError> {
        let mut rows = lock(&self.rows);
        let totals = rows.entry((*clinic_id, date)).or_default();
        totals.add(increment.kind(), increment.amount());
        Ok(*totals)
    }

    async fn daily(
        &self,
        clinic_id: &ClinicId,
        date: NaiveDate,
    ) -> Result<UsageTotals, DomainError> {
        Ok(lock(&self.rows)
            .get(&(*clinic_id, date))
            .copied()
            .unwrap_or_default())
    }

    async fn total_between(
        &self,
        clinic_id: &ClinicId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<UsageTotals, DomainError> {
        Ok(lock(&self.rows)
            .iter()
            .filter(|((id, date), _)| id == clinic_id && *date >= from && *date <= to)
            .fold(UsageTotals::default(), |acc, (_, totals)| acc.merged(totals)))
    }
}
