//! Tier entitlements.
//!
//! `EntitlementTable` is the single place limits live. It is built from
//! configuration at startup and handed to whoever needs it.

use serde::{Deserialize, Serialize};

use super::Tier;

/// Resolved feature limits for one tier. `None` message limits mean
/// unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub daily_message_limit: Option<u32>,
    pub monthly_message_limit: Option<u32>,
    pub ai_enabled: bool,
    pub ai_daily_limit: u32,
    pub ai_monthly_limit: u32,
    pub priority_support: bool,
    pub campaign_tracking: bool,
}

impl Features {
    pub fn free() -> Self {
        Self {
            daily_message_limit: Some(10),
            monthly_message_limit: Some(300),
            ai_enabled: false,
            ai_daily_limit: 0,
            ai_monthly_limit: 0,
            priority_support: false,
            campaign_tracking: false,
        }
    }

    pub fn pro() -> Self {
        Self {
            daily_message_limit: Some(50),
            monthly_message_limit: Some(500),
            ai_enabled: true,
            ai_daily_limit: 5,
            ai_monthly_limit: 50,
            priority_support: true,
            campaign_tracking: true,
        }
    }

    pub fn premium() -> Self {
        Self {
            daily_message_limit: None,
            monthly_message_limit: None,
            ai_enabled: true,
            ai_daily_limit: 20,
            ai_monthly_limit: 200,
            priority_support: true,
            campaign_tracking: true,
        }
    }

    pub fn unlimited_messages(&self) -> bool {
        self.daily_message_limit.is_none()
    }

    pub fn daily_messages_reached(&self, sent_today: u32) -> bool {
        self.daily_message_limit.is_some_and(|limit| sent_today >= limit)
    }

    pub fn monthly_messages_reached(&self, sent_this_month: u32) -> bool {
        self.monthly_message_limit
            .is_some_and(|limit| sent_this_month >= limit)
    }

    pub fn ai_daily_reached(&self, used_today: u32) -> bool {
        used_today >= self.ai_daily_limit
    }

    pub fn ai_monthly_reached(&self, used_this_month: u32) -> bool {
        used_this_month >= self.ai_monthly_limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementTable {
    free: Features,
    pro: Features,
    premium: Features,
}

impl EntitlementTable {
    pub fn new(free: Features, pro: Features, premium: Features) -> Self {
        Self { free, pro, premium }
    }

    pub fn features(&self, tier: Tier) -> Features {
        match tier {
            Tier::Free => self.free,
            Tier::Pro => self.pro,
            Tier::Premium => self.premium,
        }
    }

    /// Lookup by stored tier name. Unrecognized names get the FREE set.
    pub fn features_for_name(&self, tier: &str) -> Features {
        self.features(Tier::parse_or_free(tier))
    }
}

impl Default for EntitlementTable {
    fn default() -> Self {
        Self::new(Features::free(), Features::pro(), Features::premium())
    }
}
