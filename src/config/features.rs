//! Feature flags configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Runtime switches
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    /// Keep all state in process memory instead of Postgres (local demos)
    #[serde(default)]
    pub in_memory_storage: bool,

    /// Throttle public mutation endpoints per client IP
    #[serde(default = "default_rate_limiting")]
    pub rate_limiting: bool,

    /// Requests allowed per IP per window
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,
}

impl FeatureFlags {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rate_limiting && (self.rate_limit_requests == 0 || self.rate_limit_window_secs == 0)
        {
            return Err(ValidationError::InvalidRateLimit);
        }
        Ok(())
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            in_memory_storage: false,
            rate_limiting: default_rate_limiting(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_secs: default_rate_limit_window(),
        }
    }
}

fn default_rate_limiting() -> bool {
    true
}

fn default_rate_limit_requests() -> u32 {
    20
}

fn default_rate_limit_window() -> u64 {
    60
}
