//! Admin dashboard accounts.

mod errors;
mod user;

pub use errors::AdminError;
pub use user::{hash_password, verify_password, AdminUser};
