//! PostgreSQL implementation of UsageCounter.
//!
//! Increments are a single `INSERT ... ON CONFLICT DO UPDATE` so concurrent
//! callers never lose an update.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::domain::foundation::{ClinicId, DomainError};
use crate::domain::usage::{UsageIncrement, UsageKind, UsageTotals};
use crate::ports::UsageCounter;

use super::db_error;

pub struct PostgresUsageCounter {
    pool: PgPool,
}

impl PostgresUsageCounter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn totals(row: (i64, i64, i64)) -> UsageTotals {
    let clamp = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
    UsageTotals {
        messages_sent: clamp(row.0),
        ai_generations: clamp(row.1),
        campaigns_created: clamp(row.2),
    }
}

#[async_trait]
impl UsageCounter for PostgresUsageCounter {
    async fn increment(
        &self,
        clinic_id: &ClinicId,
        date: NaiveDate,
        increment: UsageIncrement,
    ) -> Result<UsageTotals, DomainError> {
        let mut delta = UsageTotals::default();
        delta.add(increment.kind(), increment.amount());

        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            INSERT INTO usage_tracking (clinic_id, date, messages_sent, ai_generations, campaigns_created)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (clinic_id, date) DO UPDATE SET
                messages_sent = usage_tracking.messages_sent + EXCLUDED.messages_sent,
                ai_generations = usage_tracking.ai_generations + EXCLUDED.ai_generations,
                campaigns_created = usage_tracking.campaigns_created + EXCLUDED.campaigns_created,
                updated_at = NOW()
            RETURNING messages_sent::BIGINT, ai_generations::BIGINT, campaigns_created::BIGINT
            "#,
        )
        .bind(clinic_id.as_uuid())
        .bind(date)
        .bind(delta.get(UsageKind::MessagesSent) as i32)
        .bind(delta.get(UsageKind::AiGenerations) as i32)
        .bind(delta.get(UsageKind::CampaignsCreated) as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record usage", e))?;

        Ok(totals(row))
    }

    async fn daily(&self, clinic_id: &ClinicId, date: NaiveDate) -> Result<UsageTotals, DomainError> {
        self.total_between(clinic_id, date, date).await
    }

    async fn total_between(
        &self,
        clinic_id: &ClinicId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<UsageTotals, DomainError> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(messages_sent), 0)::BIGINT,
                   COALESCE(SUM(ai_generations), 0)::BIGINT,
                   COALESCE(SUM(campaigns_created), 0)::BIGINT
            FROM usage_tracking
            WHERE clinic_id = $1 AND date BETWEEN $2 AND $3
            "#,
        )
        .bind(clinic_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read usage", e))?;

        Ok(totals(row))
    }
}
