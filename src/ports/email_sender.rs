//! Transactional email port.

use async_trait::async_trait;

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send one message. Returns the provider's message id.
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("email provider not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("email rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}
