//! Admin dashboard handlers.
//!
//! ## Commands
//!
//! - `AdminLoginHandler` - Password login issuing a session token
//! - `DeleteLeadHandler` - Remove a lead from the funnel
//!
//! ## Queries
//!
//! - `GetDashboardHandler` - Funnel rollups for a reporting period

mod admin_login;
mod delete_lead;
mod get_dashboard;

// Commands
pub use admin_login::{AdminLoginCommand, AdminLoginHandler, AdminLoginResult};
pub use delete_lead::{DeleteLeadCommand, DeleteLeadHandler};

// Queries
pub use get_dashboard::{GetDashboardHandler, GetDashboardQuery};
