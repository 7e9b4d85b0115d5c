//! Analytics reader port (read side).
//!
//! Rollups for the admin dashboard. Implementations may use whatever
//! aggregate queries suit the store; nothing here mutates.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::funnel::{FunnelCounts, LeadSummary};

#[async_trait]
pub trait AnalyticsReader: Send + Sync {
    /// Counts for everything created at or after `since`.
    async fn funnel_counts(&self, since: Timestamp) -> Result<FunnelCounts, DomainError>;

    /// Completed leads, newest first.
    async fn recent_leads(&self, since: Timestamp, limit: u32)
        -> Result<Vec<LeadSummary>, DomainError>;

    /// Leads that never completed the wizard, newest first.
    async fn abandoned_leads(
        &self,
        since: Timestamp,
        limit: u32,
    ) -> Result<Vec<LeadSummary>, DomainError>;
}
