//! Admin account storage.

use async_trait::async_trait;

use crate::domain::admin::AdminUser;
use crate::domain::foundation::{AdminUserId, DomainError, Timestamp};

#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, DomainError>;

    async fn insert(&self, admin: &AdminUser) -> Result<(), DomainError>;

    async fn record_login(&self, id: &AdminUserId, at: Timestamp) -> Result<(), DomainError>;
}
