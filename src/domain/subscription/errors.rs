//! Subscription and license errors.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidLicense / NoSubscription / SubscriptionInactive | 401 |
//! | InvalidCredentials | 401 |
//! | ClinicNotFound | 404 |
//! | EmailAlreadyRegistered | 409 |
//! | InvalidState | 409 |
//! | InvalidPlan / UnknownPaymentAmount / ValidationFailed | 400 |
//! | UpgradeRequired | 403 |
//! | UsageLimitReached | 429 |
//! | Unavailable | 503 |
//! | Upstream | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, Money, ValidationError};

use super::{SubscriptionStatus, Tier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// No clinic holds this license key.
    InvalidLicense,

    /// The clinic exists but has never had a subscription.
    NoSubscription,

    /// The subscription exists but does not grant access.
    SubscriptionInactive(SubscriptionStatus),

    ClinicNotFound,

    EmailAlreadyRegistered,

    /// Email and license key do not match.
    InvalidCredentials,

    /// The operation is not allowed in the subscription's current status.
    InvalidState(String),

    InvalidPlan(String),

    UnknownPaymentAmount(Money),

    /// The feature needs a paid tier.
    UpgradeRequired(Tier),

    UsageLimitReached {
        used: u32,
        limit: u32,
    },

    /// A required integration is not configured.
    Unavailable(String),

    ValidationFailed {
        field: String,
        message: String,
    },

    /// A third-party API call failed.
    Upstream(String),

    Infrastructure(String),
}

impl SubscriptionError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        SubscriptionError::InvalidState(message.into())
    }

    pub fn invalid_plan(plan: impl Into<String>) -> Self {
        SubscriptionError::InvalidPlan(plan.into())
    }

    pub fn unavailable(service: impl Into<String>) -> Self {
        SubscriptionError::Unavailable(service.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        SubscriptionError::Upstream(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        SubscriptionError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::InvalidLicense
            | SubscriptionError::InvalidCredentials => ErrorCode::Unauthorized,
            SubscriptionError::NoSubscription => ErrorCode::SubscriptionNotFound,
            SubscriptionError::SubscriptionInactive(_) => ErrorCode::Forbidden,
            SubscriptionError::ClinicNotFound => ErrorCode::ClinicNotFound,
            SubscriptionError::EmailAlreadyRegistered => ErrorCode::EmailAlreadyRegistered,
            SubscriptionError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            SubscriptionError::InvalidPlan(_)
            | SubscriptionError::UnknownPaymentAmount(_)
            | SubscriptionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::UpgradeRequired(_) => ErrorCode::Forbidden,
            SubscriptionError::UsageLimitReached { .. } => ErrorCode::RateLimited,
            SubscriptionError::Unavailable(_) | SubscriptionError::Upstream(_) => {
                ErrorCode::InternalError
            }
            SubscriptionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Caller-facing message. Infrastructure details are not included.
    pub fn message(&self) -> String {
        match self {
            SubscriptionError::InvalidLicense => "Invalid license key".to_string(),
            SubscriptionError::NoSubscription => "No subscription found".to_string(),
            SubscriptionError::SubscriptionInactive(status) => format!(
                "Subscription {}. Please activate your subscription.",
                status
            ),
            SubscriptionError::ClinicNotFound => "Clinic not found".to_string(),
            SubscriptionError::EmailAlreadyRegistered => "Email already registered".to_string(),
            SubscriptionError::InvalidCredentials => "Invalid credentials".to_string(),
            SubscriptionError::InvalidState(message) => message.clone(),
            SubscriptionError::InvalidPlan(plan) => format!("Invalid plan: {}", plan),
            SubscriptionError::UnknownPaymentAmount(_) => "Unknown amount".to_string(),
            SubscriptionError::UpgradeRequired(_) => {
                "AI generation is only available for PRO and PREMIUM tiers".to_string()
            }
            SubscriptionError::UsageLimitReached { .. } => {
                "Daily AI generation limit reached".to_string()
            }
            SubscriptionError::Unavailable(service) => {
                format!("{} temporarily unavailable", service)
            }
            SubscriptionError::ValidationFailed { message, .. } => message.clone(),
            SubscriptionError::Upstream(_) => "Upstream service error".to_string(),
            SubscriptionError::Infrastructure(_) => "Internal server error".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubscriptionError::Infrastructure(_) | SubscriptionError::Upstream(_)
        )
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionError::Infrastructure(detail) | SubscriptionError::Upstream(detail) => {
                write!(f, "{}: {}", self.message(), detail)
            }
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for SubscriptionError {}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => SubscriptionError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::ClinicNotFound => SubscriptionError::ClinicNotFound,
            ErrorCode::SubscriptionNotFound => SubscriptionError::NoSubscription,
            ErrorCode::EmailAlreadyRegistered => SubscriptionError::EmailAlreadyRegistered,
            ErrorCode::SubscriptionAlreadyExists => {
                SubscriptionError::InvalidState("Clinic already has a subscription".to_string())
            }
            ErrorCode::InvalidStateTransition => SubscriptionError::InvalidState(err.message),
            _ => SubscriptionError::Infrastructure(err.message),
        }
    }
}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
