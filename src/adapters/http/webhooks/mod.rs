//! HTTP adapter for payment webhooks.
//!
//! - `POST /api/webhooks/mercadopago` - Payment notifications, always acknowledged with 200

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::webhook_routes;
