//! HS256 admin session tokens.
//!
//! Implements the `AdminSessions` port with `jsonwebtoken`. Tokens carry the
//! admin id in `sub` and expire after the configured TTL.

use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::admin::AdminUser;
use crate::domain::foundation::{AdminUserId, DomainError, ErrorCode, Timestamp};
use crate::ports::{AdminIdentity, AdminSession, AdminSessions};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

pub struct JwtAdminSessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtAdminSessions {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

impl AdminSessions for JwtAdminSessions {
    fn issue(&self, admin: &AdminUser, now: Timestamp) -> Result<AdminSession, DomainError> {
        let expires_at = now.plus_secs(self.ttl.as_secs());
        let claims = Claims {
            sub: admin.id.to_string(),
            email: admin.email.clone(),
            iat: now.as_unix_secs(),
            exp: expires_at.as_unix_secs(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |e| DomainError::new(ErrorCode::InternalError, format!("Failed to sign token: {}", e)),
        )?;

        Ok(AdminSession { token, expires_at })
    }

    fn validate(&self, token: &str) -> Result<AdminIdentity, DomainError> {
        let data = decode::<Claims>(token, &self.decoding, &Self::validation()).map_err(|e| {
            tracing::debug!(error = %e, "Admin token rejected");
            DomainError::new(ErrorCode::Unauthorized, "Unauthorized")
        })?;

        let admin_id: AdminUserId = data
            .claims
            .sub
            .parse()
            .map_err(|_| DomainError::new(ErrorCode::Unauthorized, "Unauthorized"))?;

        Ok(AdminIdentity {
            admin_id,
            email: data.claims.email,
        })
    }
}
