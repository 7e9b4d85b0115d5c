//! LLM port for drafting WhatsApp messages.

use async_trait::async_trait;

use crate::domain::campaign::DraftRequest;

#[async_trait]
pub trait MessageDrafter: Send + Sync {
    /// False when no model credentials are configured. Callers check this
    /// before spending a usage slot.
    fn is_available(&self) -> bool;

    /// Returns the drafted text, trimmed.
    async fn draft(&self, request: &DraftRequest) -> Result<String, DraftError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("AI provider not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("AI provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("AI provider returned no text")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_drafter_is_object_safe() {
        fn _accepts_dyn(_drafter: &dyn MessageDrafter) {}
    }
}
