//! HTTP adapter for campaign endpoints.
//!
//! - `POST /api/campaigns/:id/ai-generate` - AI message drafting for PRO and PREMIUM

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::campaign_routes;
