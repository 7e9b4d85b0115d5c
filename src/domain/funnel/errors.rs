//! Funnel tracking and admin errors.

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunnelError {
    ValidationFailed { field: String, message: String },

    LeadNotFound,

    /// Missing or invalid admin credentials.
    Unauthorized,

    Infrastructure(String),
}

impl FunnelError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FunnelError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        FunnelError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            FunnelError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            FunnelError::LeadNotFound => ErrorCode::LeadNotFound,
            FunnelError::Unauthorized => ErrorCode::Unauthorized,
            FunnelError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            FunnelError::ValidationFailed { message, .. } => message.clone(),
            FunnelError::LeadNotFound => "Lead not found".to_string(),
            FunnelError::Unauthorized => "Unauthorized".to_string(),
            FunnelError::Infrastructure(_) => "Failed to track event".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FunnelError::Infrastructure(_))
    }
}

impl std::fmt::Display for FunnelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunnelError::Infrastructure(detail) => write!(f, "{}: {}", self.message(), detail),
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for FunnelError {}

impl From<DomainError> for FunnelError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => FunnelError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::LeadNotFound => FunnelError::LeadNotFound,
            ErrorCode::Unauthorized | ErrorCode::Forbidden => FunnelError::Unauthorized,
            _ => FunnelError::Infrastructure(err.message),
        }
    }
}

impl From<ValidationError> for FunnelError {
    fn from(err: ValidationError) -> Self {
        FunnelError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
