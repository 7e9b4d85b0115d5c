//! Per-clinic daily usage counters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ClinicId, ValidationError};

/// Largest single increment a client may report.
pub const MAX_INCREMENT: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    MessagesSent,
    AiGenerations,
    CampaignsCreated,
}

impl UsageKind {
    pub const ALL: [UsageKind; 3] = [
        UsageKind::MessagesSent,
        UsageKind::AiGenerations,
        UsageKind::CampaignsCreated,
    ];

    /// Column name in `usage_tracking`.
    pub fn column(&self) -> &'static str {
        match self {
            UsageKind::MessagesSent => "messages_sent",
            UsageKind::AiGenerations => "ai_generations",
            UsageKind::CampaignsCreated => "campaigns_created",
        }
    }

    pub fn parse(raw: &str) -> Option<UsageKind> {
        UsageKind::ALL
            .into_iter()
            .find(|kind| kind.column() == raw.trim())
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A validated request to bump one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageIncrement {
    kind: UsageKind,
    amount: u32,
}

impl UsageIncrement {
    pub fn new(kind: UsageKind, amount: u32) -> Result<Self, ValidationError> {
        if amount == 0 || amount > MAX_INCREMENT {
            return Err(ValidationError::out_of_range(
                "amount",
                1,
                i64::from(MAX_INCREMENT),
                i64::from(amount),
            ));
        }
        Ok(Self { kind, amount })
    }

    pub fn one(kind: UsageKind) -> Self {
        Self { kind, amount: 1 }
    }

    pub fn kind(&self) -> UsageKind {
        self.kind
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }
}

/// Counter values for a day or a range of days. Missing rows read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub messages_sent: u32,
    pub ai_generations: u32,
    pub campaigns_created: u32,
}

impl UsageTotals {
    pub fn get(&self, kind: UsageKind) -> u32 {
        match kind {
            UsageKind::MessagesSent => self.messages_sent,
            UsageKind::AiGenerations => self.ai_generations,
            UsageKind::CampaignsCreated => self.campaigns_created,
        }
    }

    pub fn add(&mut self, kind: UsageKind, amount: u32) {
        let slot = match kind {
            UsageKind::MessagesSent => &mut self.messages_sent,
            UsageKind::AiGenerations => &mut self.ai_generations,
            UsageKind::CampaignsCreated => &mut self.campaigns_created,
        };
        *slot = slot.saturating_add(amount);
    }

    pub fn merged(mut self, other: &UsageTotals) -> Self {
        for kind in UsageKind::ALL {
            self.add(kind, other.get(kind));
        }
        self
    }
}

/// One `usage_tracking` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub clinic_id: ClinicId,
    pub date: NaiveDate,
    pub totals: UsageTotals,
}

/// Usage for one clinic as of a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub date: NaiveDate,
    pub today: UsageTotals,
    pub month_to_date: UsageTotals,
}
