//! Clinic repository port.
//!
//! Clinics are looked up three ways: by id (webhooks), by email (signup,
//! resend, manage-subscription) and by license key (desktop client).
//!
//! # Uniqueness
//!
//! Storage enforces both unique constraints. `insert` reports a duplicate
//! email as `EmailAlreadyRegistered` and a duplicate key as
//! `LicenseKeyConflict` so callers can regenerate the key and retry.

use async_trait::async_trait;

use crate::domain::clinic::{Clinic, LicenseKey};
use crate::domain::foundation::{ClinicId, DomainError};

#[async_trait]
pub trait ClinicRepository: Send + Sync {
    /// Insert a new clinic.
    ///
    /// # Errors
    ///
    /// - `EmailAlreadyRegistered` if the email is taken
    /// - `LicenseKeyConflict` if the license key is taken
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, clinic: &Clinic) -> Result<(), DomainError>;

    /// Update mutable fields (name, contact details, tier).
    ///
    /// # Errors
    ///
    /// - `ClinicNotFound` if the clinic doesn't exist
    async fn update(&self, clinic: &Clinic) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ClinicId) -> Result<Option<Clinic>, DomainError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<Clinic>, DomainError>;

    async fn find_by_license_key(&self, key: &LicenseKey) -> Result<Option<Clinic>, DomainError>;

    /// Remove a clinic. Used to roll back a signup whose subscription
    /// could not be created.
    async fn delete(&self, id: &ClinicId) -> Result<(), DomainError>;
}
