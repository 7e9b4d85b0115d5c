//! HTTP adapter for the landing-site funnel.
//!
//! - `POST /api/analytics/track` - Page views, wizard steps, downloads, payments
//! - `POST /api/facebook/capi` - Server-side conversion events

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::funnel_routes;
