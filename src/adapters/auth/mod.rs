//! Authentication adapters.
//!
//! - `JwtAdminSessions` - HS256 admin session tokens (`AdminSessions` port)

mod jwt_sessions;

pub use jwt_sessions::JwtAdminSessions;
