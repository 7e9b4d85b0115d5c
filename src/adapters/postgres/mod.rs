//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresClinicRepository` - Clinic accounts
//! - `PostgresSubscriptionRepository` / `PostgresSubscriptionLedger` - Subscription row and history
//! - `PostgresUsageCounter` - Atomic per-day usage counters
//! - `PostgresFunnelStore` - Leads, funnel events and dashboard rollups
//! - `PostgresAdminUserRepository` - Dashboard accounts

mod admin_user_repository;
mod clinic_repository;
mod funnel_store;
mod subscription_repository;
mod usage_counter;

pub use admin_user_repository::PostgresAdminUserRepository;
pub use clinic_repository::PostgresClinicRepository;
pub use funnel_store::PostgresFunnelStore;
pub use subscription_repository::{PostgresSubscriptionLedger, PostgresSubscriptionRepository};
pub use usage_counter::PostgresUsageCounter;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Open the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(&config.url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "{}", context);
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

/// A stored value that no longer parses into the domain type.
fn corrupt(message: String) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, message)
}
