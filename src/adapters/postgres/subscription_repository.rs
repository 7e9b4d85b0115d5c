//! PostgreSQL implementations of SubscriptionRepository and SubscriptionLedger.
//!
//! `subscriptions` holds one row per clinic (`subscriptions_clinic_id_key`);
//! `subscription_events` is append-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    ClinicId, DomainError, ErrorCode, Money, SubscriptionId, Timestamp,
};
use crate::domain::subscription::{
    BillingCycle, Subscription, SubscriptionEvent, SubscriptionStatus, Tier,
};
use crate::ports::{SubscriptionLedger, SubscriptionRepository};

use super::{corrupt, db_error};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    clinic_id: Uuid,
    tier: String,
    status: String,
    billing_cycle: Option<String>,
    amount_cents: i64,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    next_tier: Option<String>,
    next_billing_cycle: Option<String>,
    cancel_at_period_end: bool,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            clinic_id: ClinicId::from_uuid(row.clinic_id),
            tier: parse_tier(&row.tier)?,
            status: SubscriptionStatus::parse(&row.status)
                .ok_or_else(|| corrupt(format!("Invalid status value: {}", row.status)))?,
            billing_cycle: row.billing_cycle.as_deref().map(parse_cycle).transpose()?,
            amount: Money::from_cents(row.amount_cents),
            current_period_start: row.current_period_start.map(Timestamp::from_datetime),
            current_period_end: row.current_period_end.map(Timestamp::from_datetime),
            next_tier: row.next_tier.as_deref().map(parse_tier).transpose()?,
            next_billing_cycle: row.next_billing_cycle.as_deref().map(parse_cycle).transpose()?,
            cancel_at_period_end: row.cancel_at_period_end,
            payment_reference: row.payment_reference,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_tier(s: &str) -> Result<Tier, DomainError> {
    Tier::parse(s).ok_or_else(|| corrupt(format!("Invalid tier value: {}", s)))
}

fn parse_cycle(s: &str) -> Result<BillingCycle, DomainError> {
    BillingCycle::parse(s).ok_or_else(|| corrupt(format!("Invalid billing_cycle value: {}", s)))
}

const SELECT_SUBSCRIPTION: &str = r#"
    SELECT id, clinic_id, tier, status, billing_cycle, amount_cents, current_period_start,
           current_period_end, next_tier, next_billing_cycle, cancel_at_period_end,
           payment_reference, created_at, updated_at
    FROM subscriptions
"#;

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, clinic_id, tier, status, billing_cycle, amount_cents,
                current_period_start, current_period_end, next_tier, next_billing_cycle,
                cancel_at_period_end, payment_reference, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.clinic_id.as_uuid())
        .bind(subscription.tier.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.billing_cycle.map(|c| c.as_str()))
        .bind(subscription.amount.cents())
        .bind(subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(subscription.next_tier.map(|t| t.as_str()))
        .bind(subscription.next_billing_cycle.map(|c| c.as_str()))
        .bind(subscription.cancel_at_period_end)
        .bind(&subscription.payment_reference)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscriptions_clinic_id_key") {
                    return DomainError::new(
                        ErrorCode::SubscriptionAlreadyExists,
                        "Clinic already has a subscription",
                    );
                }
            }
            db_error("Failed to insert subscription", e)
        })?;

        Ok(())
    }

    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, clinic_id, tier, status, billing_cycle, amount_cents,
                current_period_start, current_period_end, next_tier, next_billing_cycle,
                cancel_at_period_end, payment_reference, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (clinic_id) DO UPDATE SET
                tier = EXCLUDED.tier,
                status = EXCLUDED.status,
                billing_cycle = EXCLUDED.billing_cycle,
                amount_cents = EXCLUDED.amount_cents,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                next_tier = EXCLUDED.next_tier,
                next_billing_cycle = EXCLUDED.next_billing_cycle,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                payment_reference = EXCLUDED.payment_reference,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.clinic_id.as_uuid())
        .bind(subscription.tier.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.billing_cycle.map(|c| c.as_str()))
        .bind(subscription.amount.cents())
        .bind(subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(subscription.next_tier.map(|t| t.as_str()))
        .bind(subscription.next_billing_cycle.map(|c| c.as_str()))
        .bind(subscription.cancel_at_period_end)
        .bind(&subscription.payment_reference)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upsert subscription", e))?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                tier = $2,
                status = $3,
                billing_cycle = $4,
                amount_cents = $5,
                current_period_start = $6,
                current_period_end = $7,
                next_tier = $8,
                next_billing_cycle = $9,
                cancel_at_period_end = $10,
                payment_reference = $11,
                updated_at = $12
            WHERE clinic_id = $1
            "#,
        )
        .bind(subscription.clinic_id.as_uuid())
        .bind(subscription.tier.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.billing_cycle.map(|c| c.as_str()))
        .bind(subscription.amount.cents())
        .bind(subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(subscription.next_tier.map(|t| t.as_str()))
        .bind(subscription.next_billing_cycle.map(|c| c.as_str()))
        .bind(subscription.cancel_at_period_end)
        .bind(&subscription.payment_reference)
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update subscription", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("No subscription for clinic {}", subscription.clinic_id),
            ));
        }
        Ok(())
    }

    async fn update_if_unchanged(
        &self,
        subscription: &Subscription,
        expected_updated_at: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                tier = $2,
                status = $3,
                billing_cycle = $4,
                amount_cents = $5,
                current_period_start = $6,
                current_period_end = $7,
                next_tier = $8,
                next_billing_cycle = $9,
                cancel_at_period_end = $10,
                payment_reference = $11,
                updated_at = $12
            WHERE clinic_id = $1 AND updated_at = $13
            "#,
        )
        .bind(subscription.clinic_id.as_uuid())
        .bind(subscription.tier.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.billing_cycle.map(|c| c.as_str()))
        .bind(subscription.amount.cents())
        .bind(subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(subscription.next_tier.map(|t| t.as_str()))
        .bind(subscription.next_billing_cycle.map(|c| c.as_str()))
        .bind(subscription.cancel_at_period_end)
        .bind(&subscription.payment_reference)
        .bind(subscription.updated_at.as_datetime())
        .bind(expected_updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update subscription", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_clinic(
        &self,
        clinic_id: &ClinicId,
    ) -> Result<Option<Subscription>, DomainError> {
        let sql = format!("{} WHERE clinic_id = $1", SELECT_SUBSCRIPTION);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(clinic_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load subscription", e))?;
        row.map(Subscription::try_from).transpose()
    }

    async fn find_due_changes(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let sql = format!(
            "{} WHERE next_tier IS NOT NULL AND current_period_end < $1 \
             AND status IN ('active', 'trial') ORDER BY current_period_end",
            SELECT_SUBSCRIPTION
        );
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(now.as_datetime())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load due subscription changes", e))?;
        rows.into_iter().map(Subscription::try_from).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Ledger
// ════════════════════════════════════════════════════════════════════════════════

pub struct PostgresSubscriptionLedger {
    pool: PgPool,
}

impl PostgresSubscriptionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionLedger for PostgresSubscriptionLedger {
    async fn append(&self, event: &SubscriptionEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscription_events (clinic_id, kind, payload, occurred_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(event.clinic_id().as_uuid())
        .bind(event.kind())
        .bind(Json(event))
        .bind(event.occurred_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to append subscription event", e))?;
        Ok(())
    }

    async fn history(&self, clinic_id: &ClinicId) -> Result<Vec<SubscriptionEvent>, DomainError> {
        let rows: Vec<(Json<SubscriptionEvent>,)> = sqlx::query_as(
            r#"
            SELECT payload FROM subscription_events
            WHERE clinic_id = $1
            ORDER BY occurred_at, id
            "#,
        )
        .bind(clinic_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load subscription history", e))?;

        Ok(rows.into_iter().map(|(Json(event),)| event).collect())
    }
}
