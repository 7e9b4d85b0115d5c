//! Foundation module - Shared domain primitives.
//!
//! Identifiers, time, money and error types shared by the clinic,
//! subscription, usage and funnel domains.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AdminUserId, ClinicId, LeadId, SubscriptionId};
pub use money::Money;
pub use state_machine::StateMachine;
pub use timestamp::{month_start, Timestamp};

/// Normalizes an email for storage and lookup: trimmed and lowercased.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::empty_field("email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ValidationError::invalid_format("email", "not an email address")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(
            normalize_email("  Dra.Ana@Clinica.COM.br ").unwrap(),
            "dra.ana@clinica.com.br"
        );
    }

    #[test]
    fn normalize_email_rejects_invalid() {
        assert!(matches!(
            normalize_email("   "),
            Err(ValidationError::EmptyField { .. })
        ));
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@domain.com").is_err());
        assert!(normalize_email("user@localhost").is_err());
    }
}
