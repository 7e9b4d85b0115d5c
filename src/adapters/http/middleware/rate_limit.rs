//! Rate limiting middleware for axum.
//!
//! Public mutation endpoints (signup, key resend, admin login) get a
//! fixed-window budget per client IP and endpoint group, behind a global
//! budget that protects the service as a whole.
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the window resets
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! A limiter backend that cannot be reached lets the request through.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::state::AppState;
use crate::ports::{RateLimitDecision, RateLimitKey};

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

/// Rate limiting middleware that checks the global and per-IP limits.
///
/// The endpoint group is the request path, so each public endpoint has its
/// own per-IP budget.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.access.rate_limiting {
        return next.run(request).await;
    }
    let limiter = &state.integrations.rate_limiter;

    match limiter.hit(&RateLimitKey::Global).await {
        Ok(RateLimitDecision::Denied {
            limit,
            retry_after_secs,
        }) => return rate_limit_response(limit, retry_after_secs),
        Ok(RateLimitDecision::Allowed { .. }) => {}
        Err(e) => tracing::warn!(error = %e, "Rate limiter unavailable"),
    }

    let mut client_budget = None;
    if let Some(ip) = client_ip(request.headers(), connect_info.as_ref()) {
        let key = RateLimitKey::client(ip.as_str(), request.uri().path());
        match limiter.hit(&key).await {
            Ok(RateLimitDecision::Denied {
                limit,
                retry_after_secs,
            }) => {
                tracing::info!(ip = %ip, path = %request.uri().path(), "rate limit exceeded");
                return rate_limit_response(limit, retry_after_secs);
            }
            Ok(allowed) => client_budget = Some(allowed),
            Err(e) => tracing::warn!(error = %e, "Rate limiter unavailable for client check"),
        }
    }

    let mut response = next.run(request).await;
    if let Some(RateLimitDecision::Allowed {
        limit,
        remaining,
        reset_at,
    }) = client_budget
    {
        let headers = response.headers_mut();
        headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
        headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(remaining));
        headers.insert(
            headers::X_RATELIMIT_RESET.clone(),
            HeaderValue::from(reset_at.as_unix_secs()),
        );
    }
    response
}

/// Client IP, checking forwarded headers first.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
pub fn client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    if let Some(first) = headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(first.to_string());
    }

    if let Some(real_ip) = headers
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(real_ip.to_string());
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

fn rate_limit_response(limit: u32, retry_after_secs: u32) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "Too many requests. Please try again later.",
            "code": "RATE_LIMIT_EXCEEDED",
            "retry_after_secs": retry_after_secs
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
    headers.insert("Retry-After", HeaderValue::from(retry_after_secs));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Forwarded-For",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("X-Real-IP", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(client_ip(&headers, None), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn falls_back_to_real_ip_then_socket() {
        let mut headers = HeaderMap::new();
        let socket = ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000)));
        assert_eq!(
            client_ip(&headers, Some(&socket)),
            Some("192.0.2.1".to_string())
        );

        headers.insert("X-Real-IP", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers, Some(&socket)), Some("10.0.0.2".to_string()));
    }

    #[test]
    fn denial_sets_retry_after() {
        let response = rate_limit_response(20, 42);

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "42");
        assert_eq!(response.headers()["x-ratelimit-limit"], "20");
    }
}
