//! Leads, tracked events and the dashboard rollups over them.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, LeadId, Timestamp};
use crate::domain::funnel::{
    download_bucket, ConversionRecord, DownloadRecord, FunnelCounts, Lead, LeadStatus,
    LeadSummary, PageViewRecord, PaymentEventRecord, PaymentEventStatus,
};
use crate::ports::{AnalyticsReader, FunnelEventStore, LeadRepository};

use super::lock;

/// One store for every funnel table so the analytics reader can see all
/// of them.
#[derive(Default)]
pub struct InMemoryFunnelStore {
    leads: Mutex<HashMap<String, Lead>>,
    page_views: Mutex<Vec<PageViewRecord>>,
    downloads: Mutex<Vec<DownloadRecord>>,
    payment_events: Mutex<Vec<PaymentEventRecord>>,
    conversions: Mutex<Vec<ConversionRecord>>,
}

impl InMemoryFunnelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_views(&self) -> Vec<PageViewRecord> {
        lock(&self.page_views).clone()
    }

    pub fn downloads(&self) -> Vec<DownloadRecord> {
        lock(&self.downloads).clone()
    }

    pub fn payment_events(&self) -> Vec<PaymentEventRecord> {
        lock(&self.payment_events).clone()
    }

    pub fn conversions(&self) -> Vec<ConversionRecord> {
        lock(&self.conversions).clone()
    }

    fn leads_since(&self, since: Timestamp, completed: bool, limit: u32) -> Vec<LeadSummary> {
        let leads = lock(&self.leads);
        let mut matching: Vec<&Lead> = leads
            .values()
            .filter(|l| !l.created_at.is_before(&since))
            .filter(|l| (l.status == LeadStatus::Completed) == completed)
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
            .into_iter()
            .take(limit as usize)
            .map(LeadSummary::from)
            .collect()
    }
}

#[async_trait]
impl LeadRepository for InMemoryFunnelStore {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Lead>, DomainError> {
        Ok(lock(&self.leads).get(session_id).cloned())
    }

    async fn save(&self, lead: &Lead) -> Result<(), DomainError> {
        lock(&self.leads).insert(lead.session_id.clone(), lead.clone());
        Ok(())
    }

    async fn delete(&self, id: &LeadId) -> Result<bool, DomainError> {
        let mut leads = lock(&self.leads);
        let before = leads.len();
        leads.retain(|_, lead| &lead.id != id);
        Ok(leads.len() < before)
    }
}

#[async_trait]
impl FunnelEventStore for InMemoryFunnelStore {
    async fn record_page_view(&self, record: &PageViewRecord) -> Result<(), DomainError> {
        lock(&self.page_views).push(record.clone());
        Ok(())
    }

    async fn record_download(&self, record: &DownloadRecord) -> Result<(), DomainError> {
        lock(&self.downloads).push(record.clone());
        Ok(())
    }

    async fn record_payment_event(&self, record: &PaymentEventRecord) -> Result<(), DomainError> {
        lock(&self.payment_events).push(record.clone());
        Ok(())
    }

    async fn record_conversion(&self, record: &ConversionRecord) -> Result<(), DomainError> {
        lock(&self.conversions).push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl AnalyticsReader for InMemoryFunnelStore {
    async fn funnel_counts(&self, since: Timestamp) -> Result<FunnelCounts, DomainError> {
        let in_window = |at: &Timestamp| !at.is_before(&since);
        let mut counts = FunnelCounts::default();

        {
            let views = lock(&self.page_views);
            let recent: Vec<_> = views.iter().filter(|v| in_window(&v.occurred_at)).collect();
            counts.page_views = recent.len() as u64;
            counts.unique_sessions = recent
                .iter()
                .map(|v| v.session_id.as_str())
                .collect::<HashSet<_>>()
                .len() as u64;
        }

        {
            let leads = lock(&self.leads);
            let recent: Vec<_> = leads.values().filter(|l| in_window(&l.created_at)).collect();
            counts.leads = recent.len() as u64;
            counts.completed_leads = recent
                .iter()
                .filter(|l| l.status == LeadStatus::Completed)
                .count() as u64;
        }

        for download in lock(&self.downloads).iter().filter(|d| in_window(&d.occurred_at)) {
            counts.downloads += 1;
            match download_bucket(&download.details.plan_type) {
                "professional" => counts.professional_downloads += 1,
                "premium" => counts.premium_downloads += 1,
                _ => counts.free_downloads += 1,
            }
        }

        for event in lock(&self.payment_events).iter().filter(|e| in_window(&e.occurred_at)) {
            match event.status {
                PaymentEventStatus::Initiated => counts.payments_initiated += 1,
                PaymentEventStatus::Completed => {
                    counts.payments_completed += 1;
                    counts.revenue += event.details.amount.unwrap_or(0.0);
                }
            }
        }

        Ok(counts)
    }

    async fn recent_leads(
        &self,
        since: Timestamp,
        limit: u32,
    ) -> Result<Vec<LeadSummary>, DomainError> {
        Ok(self.leads_since(since, true, limit))
    }

    async fn abandoned_leads(
        &self,
        since: Timestamp,
        limit: u32,
    ) -> Result<Vec<LeadSummary>, DomainError> {
        Ok(self.leads_since(since, false, limit))
    }
}
