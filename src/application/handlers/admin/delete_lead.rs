//! DeleteLeadHandler - Removes one lead by id.

use std::sync::Arc;

use crate::domain::foundation::LeadId;
use crate::domain::funnel::FunnelError;
use crate::ports::LeadRepository;

#[derive(Debug, Clone)]
pub struct DeleteLeadCommand {
    /// Raw `id` query value.
    pub id: Option<String>,
}

pub struct DeleteLeadHandler {
    leads: Arc<dyn LeadRepository>,
}

impl DeleteLeadHandler {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self { leads }
    }

    /// # Errors
    ///
    /// - `ValidationFailed` for a missing or malformed id
    /// - `LeadNotFound` when nothing was deleted
    pub async fn handle(&self, cmd: DeleteLeadCommand) -> Result<(), FunnelError> {
        let raw = cmd
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| FunnelError::validation("id", "Missing lead ID"))?;
        let id: LeadId = raw
            .parse()
            .map_err(|_| FunnelError::validation("id", "Invalid lead ID"))?;

        if !self.leads.delete(&id).await? {
            return Err(FunnelError::LeadNotFound);
        }
        tracing::info!(lead_id = %id, "lead deleted");
        Ok(())
    }
}
