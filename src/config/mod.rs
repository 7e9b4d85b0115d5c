//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `REACTOR` prefix and
//! nested values are separated by a double underscore.
//!
//! # Example
//!
//! ```no_run
//! use reactor_backend::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod auth;
mod billing;
mod conversions;
mod database;
mod email;
mod error;
mod features;
mod payment;
mod redis;
mod report;
mod server;

pub use ai::AiConfig;
pub use auth::AuthConfig;
pub use billing::BillingConfig;
pub use conversions::ConversionsConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use features::FeatureFlags;
pub use payment::PaymentConfig;
pub use redis::RedisConfig;
pub use report::ConfigReport;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub conversions: ConversionsConfig,

    #[serde(default)]
    pub billing: BillingConfig,

    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `REACTOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// - `REACTOR__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `REACTOR__PAYMENT__MERCADOPAGO_ACCESS_TOKEN=...` -> `payment.mercadopago_access_token`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("REACTOR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// The database section is skipped in in-memory mode.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if !self.features.in_memory_storage {
            self.database.validate()?;
        }
        self.redis.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.payment.validate()?;
        self.email.validate(&self.server.environment)?;
        self.ai.validate()?;
        self.conversions.validate()?;
        self.billing.validate()?;
        self.features.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
