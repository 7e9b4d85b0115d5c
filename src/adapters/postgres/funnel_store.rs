//! PostgreSQL funnel storage: leads, event tables and dashboard rollups.
//!
//! One struct implements `LeadRepository`, `FunnelEventStore` and
//! `AnalyticsReader` since they share the same tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, LeadId, Timestamp};
use crate::domain::funnel::{
    CalculatorInputs, ContactDetails, ConversionRecord, DownloadRecord, FunnelCounts, Lead,
    LeadStatus, LeadSummary, PageViewRecord, PaymentEventRecord, PAYMENT_PROVIDER,
};
use crate::ports::{AnalyticsReader, FunnelEventStore, LeadRepository};

use super::{corrupt, db_error};

pub struct PostgresFunnelStore {
    pool: PgPool,
}

impl PostgresFunnelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    session_id: String,
    status: String,
    total_patients: Option<i32>,
    average_ticket: Option<f64>,
    inactive_percent: Option<f64>,
    lost_revenue: Option<f64>,
    clinic_name: Option<String>,
    name: Option<String>,
    email: Option<String>,
    whatsapp: Option<String>,
    abandoned_at_step: Option<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = DomainError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let status = LeadStatus::parse(&row.status)
            .ok_or_else(|| corrupt(format!("Invalid lead status: {}", row.status)))?;

        Ok(Lead {
            id: LeadId::from_uuid(row.id),
            session_id: row.session_id,
            status,
            calculator: CalculatorInputs {
                total_patients: row.total_patients,
                average_ticket: row.average_ticket,
                inactive_percent: row.inactive_percent,
                lost_revenue: row.lost_revenue,
            },
            contact: ContactDetails {
                clinic_name: row.clinic_name,
                name: row.name,
                email: row.email,
                whatsapp: row.whatsapp,
            },
            abandoned_at_step: row.abandoned_at_step,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

const SELECT_LEAD: &str = r#"
    SELECT id, session_id, status, total_patients, average_ticket, inactive_percent,
           lost_revenue, clinic_name, name, email, whatsapp, abandoned_at_step,
           created_at, updated_at, completed_at
    FROM leads
"#;

impl PostgresFunnelStore {
    async fn leads_since(
        &self,
        since: Timestamp,
        completed: bool,
        limit: u32,
    ) -> Result<Vec<LeadSummary>, DomainError> {
        let status_filter = if completed {
            "status = 'completed'"
        } else {
            "status <> 'completed'"
        };
        let sql = format!(
            "{} WHERE created_at >= $1 AND {} ORDER BY created_at DESC LIMIT $2",
            SELECT_LEAD, status_filter
        );
        let rows: Vec<LeadRow> = sqlx::query_as(&sql)
            .bind(since.as_datetime())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load leads", e))?;

        rows.into_iter()
            .map(|row| Lead::try_from(row).map(|lead| LeadSummary::from(&lead)))
            .collect()
    }
}

#[async_trait]
impl LeadRepository for PostgresFunnelStore {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Lead>, DomainError> {
        let sql = format!("{} WHERE session_id = $1", SELECT_LEAD);
        let row: Option<LeadRow> = sqlx::query_as(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load lead", e))?;
        row.map(Lead::try_from).transpose()
    }

    async fn save(&self, lead: &Lead) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO leads (
                id, session_id, status, total_patients, average_ticket, inactive_percent,
                lost_revenue, clinic_name, name, email, whatsapp, abandoned_at_step,
                created_at, updated_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (session_id) DO UPDATE SET
                status = EXCLUDED.status,
                total_patients = EXCLUDED.total_patients,
                average_ticket = EXCLUDED.average_ticket,
                inactive_percent = EXCLUDED.inactive_percent,
                lost_revenue = EXCLUDED.lost_revenue,
                clinic_name = EXCLUDED.clinic_name,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                whatsapp = EXCLUDED.whatsapp,
                abandoned_at_step = EXCLUDED.abandoned_at_step,
                updated_at = EXCLUDED.updated_at,
                completed_at = EXCLUDED.completed_at
            "#,
        )
        .bind(lead.id.as_uuid())
        .bind(&lead.session_id)
        .bind(lead.status.as_str())
        .bind(lead.calculator.total_patients)
        .bind(lead.calculator.average_ticket)
        .bind(lead.calculator.inactive_percent)
        .bind(lead.calculator.lost_revenue)
        .bind(&lead.contact.clinic_name)
        .bind(&lead.contact.name)
        .bind(&lead.contact.email)
        .bind(&lead.contact.whatsapp)
        .bind(lead.abandoned_at_step)
        .bind(lead.created_at.as_datetime())
        .bind(lead.updated_at.as_datetime())
        .bind(lead.completed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save lead", e))?;
        Ok(())
    }

    async fn delete(&self, id: &LeadId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete lead", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl FunnelEventStore for PostgresFunnelStore {
    async fn record_page_view(&self, record: &PageViewRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO page_views (session_id, page, referrer, user_agent, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.session_id)
        .bind(&record.page)
        .bind(&record.meta.referrer)
        .bind(&record.meta.user_agent)
        .bind(&record.meta.ip_address)
        .bind(record.occurred_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record page view", e))?;
        Ok(())
    }

    async fn record_download(&self, record: &DownloadRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO downloads (session_id, email, plan_type, license_key, source_page, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.session_id)
        .bind(&record.details.email)
        .bind(&record.details.plan_type)
        .bind(&record.details.license_key)
        .bind(&record.details.source_page)
        .bind(record.occurred_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record download", e))?;
        Ok(())
    }

    async fn record_payment_event(&self, record: &PaymentEventRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payment_events (
                session_id, email, plan_type, amount, status, payment_provider, payment_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&record.session_id)
        .bind(&record.details.email)
        .bind(&record.details.plan_type)
        .bind(record.details.amount)
        .bind(record.status.as_str())
        .bind(PAYMENT_PROVIDER)
        .bind(&record.details.payment_id)
        .bind(record.occurred_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record payment event", e))?;
        Ok(())
    }

    async fn record_conversion(&self, record: &ConversionRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO conversion_events (session_id, event_name, value, data, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.session_id)
        .bind(&record.details.event_name)
        .bind(record.details.value)
        .bind(Json(&record.details.data))
        .bind(record.occurred_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record conversion", e))?;
        Ok(())
    }
}

fn count(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

#[async_trait]
impl AnalyticsReader for PostgresFunnelStore {
    async fn funnel_counts(&self, since: Timestamp) -> Result<FunnelCounts, DomainError> {
        let since = since.as_datetime();

        let (page_views, unique_sessions): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT session_id) FROM page_views WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count page views", e))?;

        let (leads, completed_leads): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'completed')
            FROM leads WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count leads", e))?;

        let (downloads, professional, premium): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE LOWER(TRIM(plan_type)) IN ('professional', 'pro')),
                   COUNT(*) FILTER (WHERE LOWER(TRIM(plan_type)) = 'premium')
            FROM downloads WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count downloads", e))?;

        let (initiated, completed, revenue): (i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'initiated'),
                   COUNT(*) FILTER (WHERE status = 'completed'),
                   COALESCE(SUM(amount) FILTER (WHERE status = 'completed'), 0)::FLOAT8
            FROM payment_events WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count payment events", e))?;

        Ok(FunnelCounts {
            page_views: count(page_views),
            unique_sessions: count(unique_sessions),
            leads: count(leads),
            completed_leads: count(completed_leads),
            downloads: count(downloads),
            free_downloads: count(downloads - professional - premium),
            professional_downloads: count(professional),
            premium_downloads: count(premium),
            payments_initiated: count(initiated),
            payments_completed: count(completed),
            revenue,
        })
    }

    async fn recent_leads(
        &self,
        since: Timestamp,
        limit: u32,
    ) -> Result<Vec<LeadSummary>, DomainError> {
        self.leads_since(since, true, limit).await
    }

    async fn abandoned_leads(
        &self,
        since: Timestamp,
        limit: u32,
    ) -> Result<Vec<LeadSummary>, DomainError> {
        self.leads_since(since, false, limit).await
    }
}
