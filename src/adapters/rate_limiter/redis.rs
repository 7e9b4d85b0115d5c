//! Redis-backed rate limiter, shared by every replica.
//!
//! One MULTI/EXEC round trip per request:
//! `SET key 0 NX EX window`, `INCR key`, `TTL key`.
//! The expiry is attached when the window opens, so a counter can never
//! outlive its window. Requests can briefly exceed the limit at window
//! boundaries.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitDecision, RateLimitError, RateLimitKey, RateLimiter};

use super::config::RateLimitConfig;

#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    /// Opens a multiplexed connection and checks it with `PING`.
    pub async fn connect(url: &str, config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let mut conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(Self { conn, config })
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn hit(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError> {
        let storage_key = key.storage_key();
        let window_secs = self.config.window_secs;
        let mut conn = self.conn.clone();

        let (count, ttl): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&storage_key)
            .arg(0)
            .arg("NX")
            .arg("EX")
            .arg(window_secs)
            .ignore()
            .incr(&storage_key, 1)
            .ttl(&storage_key)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        // TTL is negative only if the key vanished between commands
        let secs_left = if ttl > 0 {
            ttl.min(i64::from(window_secs)) as u32
        } else {
            window_secs
        };

        Ok(RateLimitDecision::for_count(
            count,
            self.config.limit_for(key),
            secs_left,
            Timestamp::now(),
        ))
    }
}

fn unavailable(err: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(err.to_string())
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
