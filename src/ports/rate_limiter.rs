//! Request budgets for the unauthenticated endpoints.
//!
//! Signup, license resend and admin login answer anyone, so every client IP
//! gets a fixed-window budget per endpoint, all under one global budget.
//! Backends only count; turning a count into a decision happens here so the
//! Redis and in-memory limiters agree.

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;

const KEY_NAMESPACE: &str = "reactor:rl";

/// Port for fixed-window request counting.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request against `key` and reports whether it fits the window.
    async fn hit(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError>;
}

/// What a request is counted against.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum RateLimitKey {
    /// Every limited request, whatever its origin.
    Global,
    /// One client address on one endpoint.
    Client { ip: String, endpoint: String },
}

impl RateLimitKey {
    pub fn client(ip: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::Client {
            ip: ip.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// Key under which a backend stores the window counter.
    pub fn storage_key(&self) -> String {
        match self {
            Self::Global => format!("{}:global", KEY_NAMESPACE),
            Self::Client { ip, endpoint } => format!(
                "{}:{}:{}",
                KEY_NAMESPACE,
                endpoint.trim_matches('/').replace('/', "."),
                ip
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed {
        limit: u32,
        remaining: u32,
        reset_at: Timestamp,
    },
    Denied {
        limit: u32,
        retry_after_secs: u32,
    },
}

impl RateLimitDecision {
    /// Decision for the `count`-th request of a window that still has
    /// `secs_left` seconds to run.
    pub fn for_count(count: u64, limit: u32, secs_left: u32, now: Timestamp) -> Self {
        if count > u64::from(limit) {
            return Self::Denied {
                limit,
                retry_after_secs: secs_left.max(1),
            };
        }
        Self::Allowed {
            limit,
            remaining: limit - count as u32,
            reset_at: now.plus_secs(u64::from(secs_left)),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Backend unreachable. Callers let the request through.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
