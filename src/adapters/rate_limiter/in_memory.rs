//! Per-process rate limiter.
//!
//! Used in tests, in in-memory mode and whenever Redis cannot be reached at
//! startup. Counts live in one process, so a horizontally scaled deployment
//! gives each replica its own budget.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitDecision, RateLimitError, RateLimitKey, RateLimiter};

use super::config::RateLimitConfig;

/// Expired windows are dropped once this many keys are tracked.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: i64,
    count: u64,
}

impl Window {
    fn ends_at(&self, window_secs: u32) -> i64 {
        self.started_at + i64::from(window_secs)
    }
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    async fn hit_at(&self, key: &RateLimitKey, now: Timestamp) -> RateLimitDecision {
        let now_secs = now.as_unix_secs();
        let window_secs = self.config.window_secs;
        let mut windows = self.windows.lock().await;

        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|_, window| window.ends_at(window_secs) > now_secs);
        }

        let window = windows.entry(key.storage_key()).or_insert(Window {
            started_at: now_secs,
            count: 0,
        });
        if window.ends_at(window_secs) <= now_secs {
            *window = Window {
                started_at: now_secs,
                count: 0,
            };
        }
        window.count = window.count.saturating_add(1);

        let secs_left = (window.ends_at(window_secs) - now_secs).clamp(0, i64::from(u32::MAX));
        RateLimitDecision::for_count(
            window.count,
            self.config.limit_for(key),
            secs_left as u32,
            now,
        )
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn hit(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError> {
        Ok(self.hit_at(key, Timestamp::now()).await)
    }
}
