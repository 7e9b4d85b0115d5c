//! Admin session tokens.
//!
//! Issued on successful login and presented as a bearer token on admin
//! endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::admin::AdminUser;
use crate::domain::foundation::{AdminUserId, DomainError, Timestamp};

/// A freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Identity recovered from a valid token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub admin_id: AdminUserId,
    pub email: String,
}

pub trait AdminSessions: Send + Sync {
    fn issue(&self, admin: &AdminUser, now: Timestamp) -> Result<AdminSession, DomainError>;

    /// # Errors
    ///
    /// - `Unauthorized` for a malformed, forged or expired token
    fn validate(&self, token: &str) -> Result<AdminIdentity, DomainError>;
}
