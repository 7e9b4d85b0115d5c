//! Authentication configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

const MIN_SERVICE_TOKEN_LEN: usize = 16;
const MIN_JWT_SECRET_LEN: usize = 32;

/// Credentials guarding the service and admin endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Bearer token the desktop client presents to verification and usage endpoints
    #[serde(default)]
    pub service_token: String,

    /// Static bearer token accepted by admin endpoints (dashboard automation)
    pub admin_dashboard_token: Option<String>,

    /// HS256 secret for admin session tokens issued at login
    #[serde(default)]
    pub admin_jwt_secret: String,

    /// Admin session lifetime in hours
    #[serde(default = "default_session_ttl")]
    pub admin_session_ttl_hours: u64,
}

impl AuthConfig {
    pub fn admin_session_ttl(&self) -> Duration {
        Duration::from_secs(self.admin_session_ttl_hours * 3600)
    }

    /// Static dashboard token when one is configured and non-empty
    pub fn admin_dashboard_token(&self) -> Option<&str> {
        self.admin_dashboard_token
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    /// Validate authentication configuration
    ///
    /// Token length minimums are only enforced outside development so local
    /// runs can use short throwaway values.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.service_token.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__SERVICE_TOKEN"));
        }
        if self.admin_jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__ADMIN_JWT_SECRET"));
        }

        if *environment != Environment::Development {
            if self.service_token.len() < MIN_SERVICE_TOKEN_LEN {
                return Err(ValidationError::ServiceTokenTooShort(MIN_SERVICE_TOKEN_LEN));
            }
            if self.admin_jwt_secret.len() < MIN_JWT_SECRET_LEN {
                return Err(ValidationError::JwtSecretTooShort(MIN_JWT_SECRET_LEN));
            }
        }

        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            service_token: String::new(),
            admin_dashboard_token: None,
            admin_jwt_secret: String::new(),
            admin_session_ttl_hours: default_session_ttl(),
        }
    }
}

fn default_session_ttl() -> u64 {
    12
}
