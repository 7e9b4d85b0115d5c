//! HTTP adapter for direct signup.
//!
//! - `POST /api/users/create` - Create a clinic, its subscription and license key

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::signup_routes;
