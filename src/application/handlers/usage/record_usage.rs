//! RecordUsageHandler - Bumps one usage counter for the clinic holding a key.

use std::sync::Arc;

use crate::application::handlers::license::clinic_for_key;
use crate::domain::foundation::{ClinicId, Timestamp};
use crate::domain::subscription::SubscriptionError;
use crate::domain::usage::{UsageIncrement, UsageKind, UsageSnapshot};
use crate::ports::{ClinicRepository, UsageCounter};

use super::usage_snapshot;

#[derive(Debug, Clone)]
pub struct RecordUsageCommand {
    pub license_key: String,
    /// Column name, e.g. `messages_sent`.
    pub kind: String,
    pub amount: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RecordUsageResult {
    pub clinic_id: ClinicId,
    pub kind: UsageKind,
    pub usage: UsageSnapshot,
}

pub struct RecordUsageHandler {
    clinics: Arc<dyn ClinicRepository>,
    usage: Arc<dyn UsageCounter>,
}

impl RecordUsageHandler {
    pub fn new(clinics: Arc<dyn ClinicRepository>, usage: Arc<dyn UsageCounter>) -> Self {
        Self { clinics, usage }
    }

    pub async fn handle(&self, cmd: RecordUsageCommand) -> Result<RecordUsageResult, SubscriptionError> {
        // 1. Validate increment
        let kind = UsageKind::parse(&cmd.kind).ok_or_else(|| {
            SubscriptionError::validation(
                "type",
                "type must be one of messages_sent, ai_generations, campaigns_created",
            )
        })?;
        let increment = UsageIncrement::new(kind, cmd.amount.unwrap_or(1))?;

        // 2. Resolve clinic
        let clinic = clinic_for_key(self.clinics.as_ref(), &cmd.license_key).await?;

        // 3. Increment and report
        let today = Timestamp::now().date();
        self.usage.increment(&clinic.id, today, increment).await?;
        let usage = usage_snapshot(self.usage.as_ref(), &clinic.id, today).await?;

        tracing::debug!(clinic_id = %clinic.id, kind = %kind, amount = increment.amount(), "usage recorded");
        Ok(RecordUsageResult {
            clinic_id: clinic.id,
            kind,
            usage,
        })
    }
}
