//! Lead repository port. Leads are keyed by browser session.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, LeadId};
use crate::domain::funnel::Lead;

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Lead>, DomainError>;

    /// Insert or update by `session_id`.
    async fn save(&self, lead: &Lead) -> Result<(), DomainError>;

    /// Returns false when no lead had this id.
    async fn delete(&self, id: &LeadId) -> Result<bool, DomainError>;
}
