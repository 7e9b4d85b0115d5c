//! Rate limit configuration types.

use serde::{Deserialize, Serialize};

use crate::config::FeatureFlags;
use crate::ports::RateLimitKey;

/// Fixed-window budgets per scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per window across all clients (infrastructure protection).
    pub global_requests: u32,
    /// Requests per window per client IP and endpoint group.
    pub ip_requests: u32,
    pub window_secs: u32,
}

impl RateLimitConfig {
    pub fn from_flags(flags: &FeatureFlags) -> Self {
        Self {
            ip_requests: flags.rate_limit_requests,
            window_secs: flags.rate_limit_window_secs.min(u32::MAX as u64) as u32,
            ..Self::default()
        }
    }

    /// Requests allowed per window for `key`.
    pub fn limit_for(&self, key: &RateLimitKey) -> u32 {
        if key.is_global() {
            self.global_requests
        } else {
            self.ip_requests
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_requests: 10_000,
            ip_requests: 20,
            window_secs: 60,
        }
    }
}
