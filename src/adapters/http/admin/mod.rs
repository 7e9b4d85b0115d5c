//! HTTP adapter for the admin dashboard.
//!
//! - `POST /api/admin/login` - Admin session token
//! - `GET /api/admin/analytics` - Funnel overview
//! - `DELETE /api/admin/leads/delete` - Delete a lead

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::admin_routes;
