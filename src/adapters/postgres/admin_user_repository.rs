//! PostgreSQL implementation of AdminUserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::admin::AdminUser;
use crate::domain::foundation::{AdminUserId, DomainError, ErrorCode, Timestamp};
use crate::ports::AdminUserRepository;

use super::db_error;

pub struct PostgresAdminUserRepository {
    pool: PgPool,
}

impl PostgresAdminUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    password_hash: String,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<AdminUserRow> for AdminUser {
    fn from(row: AdminUserRow) -> Self {
        AdminUser {
            id: AdminUserId::from_uuid(row.id),
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            last_login_at: row.last_login_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl AdminUserRepository for PostgresAdminUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, DomainError> {
        let row: Option<AdminUserRow> = sqlx::query_as(
            r#"
            SELECT id, email, name, password_hash, last_login_at, created_at
            FROM admin_users WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load admin user", e))?;
        Ok(row.map(AdminUser::from))
    }

    async fn insert(&self, admin: &AdminUser) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO admin_users (id, email, name, password_hash, last_login_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(admin.id.as_uuid())
        .bind(&admin.email)
        .bind(&admin.name)
        .bind(&admin.password_hash)
        .bind(admin.last_login_at.map(|t| *t.as_datetime()))
        .bind(admin.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("admin_users_email_key") {
                    return DomainError::new(
                        ErrorCode::EmailAlreadyRegistered,
                        "Admin email already registered",
                    );
                }
            }
            db_error("Failed to insert admin user", e)
        })?;
        Ok(())
    }

    async fn record_login(&self, id: &AdminUserId, at: Timestamp) -> Result<(), DomainError> {
        sqlx::query("UPDATE admin_users SET last_login_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to record admin login", e))?;
        Ok(())
    }
}
