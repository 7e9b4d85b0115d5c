//! Admin login and session errors.

use crate::domain::foundation::{DomainError, ErrorCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// Email and password are both required.
    MissingCredentials,

    InvalidCredentials,

    /// Missing, expired or unknown session token.
    Unauthorized,

    Infrastructure(String),
}

impl AdminError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AdminError::MissingCredentials => ErrorCode::ValidationFailed,
            AdminError::InvalidCredentials | AdminError::Unauthorized => ErrorCode::Unauthorized,
            AdminError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AdminError::MissingCredentials => "Email e senha são obrigatórios".to_string(),
            AdminError::InvalidCredentials => "Email ou senha incorretos".to_string(),
            AdminError::Unauthorized => "Unauthorized".to_string(),
            AdminError::Infrastructure(_) => "Erro ao fazer login. Tente novamente.".to_string(),
        }
    }
}

impl std::fmt::Display for AdminError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminError::Infrastructure(detail) => write!(f, "{}: {}", self.message(), detail),
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for AdminError {}

impl From<DomainError> for AdminError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Unauthorized | ErrorCode::Forbidden => AdminError::Unauthorized,
            _ => AdminError::Infrastructure(err.message),
        }
    }
}
