//! AdminLoginHandler - Email and password login for the dashboard.

use std::sync::Arc;

use crate::domain::admin::{AdminError, AdminUser};
use crate::domain::foundation::Timestamp;
use crate::ports::{AdminSession, AdminSessions, AdminUserRepository};

#[derive(Debug, Clone)]
pub struct AdminLoginCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AdminLoginResult {
    pub admin: AdminUser,
    pub session: AdminSession,
}

pub struct AdminLoginHandler {
    admins: Arc<dyn AdminUserRepository>,
    sessions: Arc<dyn AdminSessions>,
}

impl AdminLoginHandler {
    pub fn new(admins: Arc<dyn AdminUserRepository>, sessions: Arc<dyn AdminSessions>) -> Self {
        Self { admins, sessions }
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn handle(&self, cmd: AdminLoginCommand) -> Result<AdminLoginResult, AdminError> {
        let email = cmd.email.trim().to_lowercase();
        if email.is_empty() || cmd.password.is_empty() {
            return Err(AdminError::MissingCredentials);
        }

        // 1. Find and verify
        let admin = self
            .admins
            .find_by_email(&email)
            .await?
            .ok_or(AdminError::InvalidCredentials)?;
        if !admin.verify(&cmd.password) {
            tracing::info!(admin_id = %admin.id, "admin login rejected");
            return Err(AdminError::InvalidCredentials);
        }

        // 2. Session
        let now = Timestamp::now();
        if let Err(err) = self.admins.record_login(&admin.id, now).await {
            tracing::warn!(admin_id = %admin.id, error = %err, "failed to record admin login");
        }
        let session = self.sessions.issue(&admin, now)?;

        tracing::info!(admin_id = %admin.id, "admin logged in");
        Ok(AdminLoginResult { admin, session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::JwtAdminSessions;
    use crate::adapters::memory::InMemoryAdminUserRepository;
    use crate::domain::foundation::AdminUserId;
    use std::time::Duration;

    async fn fixture() -> (AdminLoginHandler, Arc<JwtAdminSessions>, AdminUser) {
        let admins = Arc::new(InMemoryAdminUserRepository::new());
        let admin = AdminUser::new(
            AdminUserId::new(),
            "admin@lkdigital.org",
            Some("Admin".to_string()),
            "s3nha-forte",
            Timestamp::now(),
        )
        .unwrap();
        admins.insert(&admin).await.unwrap();
        let sessions = Arc::new(JwtAdminSessions::new(
            "test-secret-at-least-32-bytes-long!!",
            Duration::from_secs(3600),
        ));
        (AdminLoginHandler::new(admins, sessions.clone()), sessions, admin)
    }

    fn login(email: &str, password: &str) -> AdminLoginCommand {
        AdminLoginCommand {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn valid_login_issues_verifiable_token() {
        let (handler, sessions, admin) = fixture().await;

        let result = handler
            .handle(login(" Admin@LKDigital.org ", "s3nha-forte"))
            .await
            .unwrap();

        assert_eq!(result.admin.id, admin.id);
        let identity = sessions.validate(&result.session.token).unwrap();
        assert_eq!(identity.admin_id, admin.id);
        assert!(result.session.expires_at > Timestamp::now());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (handler, _, _) = fixture().await;

        let wrong = handler
            .handle(login("admin@lkdigital.org", "errada"))
            .await
            .unwrap_err();
        let unknown = handler
            .handle(login("ninguem@lkdigital.org", "s3nha-forte"))
            .await
            .unwrap_err();

        assert_eq!(wrong, AdminError::InvalidCredentials);
        assert_eq!(unknown, AdminError::InvalidCredentials);
        assert_eq!(wrong.message(), "Email ou senha incorretos");
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected() {
        let (handler, _, _) = fixture().await;

        let err = handler.handle(login("", "x")).await.unwrap_err();

        assert_eq!(err, AdminError::MissingCredentials);
    }
}
