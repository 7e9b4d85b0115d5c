//! Admin accounts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::admin::AdminUser;
use crate::domain::foundation::{AdminUserId, DomainError, ErrorCode, Timestamp};
use crate::ports::AdminUserRepository;

use super::lock;

#[derive(Default)]
pub struct InMemoryAdminUserRepository {
    admins: Mutex<HashMap<AdminUserId, AdminUser>>,
}

impl InMemoryAdminUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminUserRepository for InMemoryAdminUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, DomainError> {
        Ok(lock(&self.admins)
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn insert(&self, admin: &AdminUser) -> Result<(), DomainError> {
        let mut admins = lock(&self.admins);
        if admins.values().any(|a| a.email == admin.email) {
            return Err(DomainError::new(
                ErrorCode::EmailAlreadyRegistered,
                "Admin email already registered",
            ));
        }
        admins.insert(admin.id, admin.clone());
        Ok(())
    }

    async fn record_login(&self, id: &AdminUserId, at: Timestamp) -> Result<(), DomainError> {
        if let Some(admin) = lock(&self.admins).get_mut(id) {
            admin.last_login_at = Some(at);
        }
        Ok(())
    }
}
