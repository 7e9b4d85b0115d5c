//! HTTP adapter for license endpoints.
//!
//! - `POST /api/auth/verify-license` - Entitlements and usage for the desktop client
//! - `POST /api/usage/record` - Usage counters reported by the desktop client
//! - `POST /api/auth/resend-license` - Email the license key, creating a trial if needed
//! - `POST /api/auth/manage-subscription` - Subscription info or a scheduled downgrade
//! - `GET /api/clinics/get-by-email` - Public clinic fields

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::license_routes;
