//! HTTP middleware for axum.
//!
//! - `auth` - Service token and admin authentication
//! - `rate_limit` - Per-IP limits on public mutation endpoints

pub mod auth;
pub mod rate_limit;

pub use auth::{
    bearer_token, require_admin, require_service_token, AdminPrincipal, AuthRejection,
    RequireAdmin,
};
pub use rate_limit::{client_ip, rate_limit_middleware};
