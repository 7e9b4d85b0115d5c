//! HTTP DTOs for the admin dashboard.

use serde::{Deserialize, Serialize};

use crate::application::handlers::admin::AdminLoginResult;
use crate::config::ConfigReport;
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Query string for `GET /api/admin/analytics`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsParams {
    /// Reporting window in days.
    #[serde(default)]
    pub period: Option<String>,
}

/// Query string for `DELETE /api/admin/leads/delete`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteLeadParams {
    #[serde(default)]
    pub id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: Timestamp,
    pub user: AdminUserResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl From<AdminLoginResult> for AdminLoginResponse {
    fn from(result: AdminLoginResult) -> Self {
        Self {
            success: true,
            token: result.session.token,
            expires_at: result.session.expires_at,
            user: AdminUserResponse {
                id: result.admin.id.to_string(),
                email: result.admin.email,
                name: result.admin.name,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteLeadResponse {
    pub success: bool,
}

/// `GET /api/admin/diagnostic` body.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticResponse {
    /// `OK` or `INCOMPLETE`
    pub status: &'static str,
    pub checks: ConfigReport,
    pub missing: Vec<&'static str>,
    pub message: String,
    pub timestamp: Timestamp,
}

impl DiagnosticResponse {
    pub fn new(checks: ConfigReport, timestamp: Timestamp) -> Self {
        let missing = checks.missing();
        let (status, message) = if missing.is_empty() {
            ("OK", "All required settings are present".to_string())
        } else {
            (
                "INCOMPLETE",
                format!("Missing required settings: {}", missing.join(", ")),
            )
        };
        Self {
            status,
            checks,
            missing,
            message,
            timestamp,
        }
    }
}
