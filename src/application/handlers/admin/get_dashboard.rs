//! GetDashboardHandler - Funnel rollups for the admin dashboard.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::funnel::{AnalyticsOverview, FunnelError, ReportingPeriod};
use crate::ports::AnalyticsReader;

const RECENT_LEADS_LIMIT: u32 = 10;
const ABANDONED_LEADS_LIMIT: u32 = 20;

#[derive(Debug, Clone, Default)]
pub struct GetDashboardQuery {
    /// Raw `period` query value in days.
    pub period: Option<String>,
}

pub struct GetDashboardHandler {
    reader: Arc<dyn AnalyticsReader>,
}

impl GetDashboardHandler {
    pub fn new(reader: Arc<dyn AnalyticsReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: GetDashboardQuery) -> Result<AnalyticsOverview, FunnelError> {
        let period = ReportingPeriod::parse(query.period.as_deref())?;
        let since = period.since(Timestamp::now());

        let counts = self.reader.funnel_counts(since).await?;
        let recent = self.reader.recent_leads(since, RECENT_LEADS_LIMIT).await?;
        let abandoned = self
            .reader
            .abandoned_leads(since, ABANDONED_LEADS_LIMIT)
            .await?;

        Ok(AnalyticsOverview::build(period, &counts, recent, abandoned))
    }
}
