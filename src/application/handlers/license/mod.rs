//! License key handlers used by the desktop client and the landing site.
//!
//! ## Commands
//!
//! - `ResendLicenseHandler` - Find or create a trial account and email its key
//!
//! ## Queries
//!
//! - `VerifyLicenseHandler` - Resolve clinic, subscription, entitlements and usage
//! - `GetClinicByEmailHandler` - Public clinic fields for an email

mod get_clinic_by_email;
mod resend_license;
mod verify_license;

// Commands
pub use resend_license::{ResendLicenseCommand, ResendLicenseHandler, ResendLicenseResult};

// Queries
pub use get_clinic_by_email::{GetClinicByEmailHandler, GetClinicByEmailQuery};
pub use verify_license::{VerifyLicenseCommand, VerifyLicenseHandler, VerifyLicenseResult};

use crate::domain::clinic::{Clinic, LicenseKey};
use crate::domain::subscription::SubscriptionError;
use crate::ports::ClinicRepository;

/// Clinic holding `raw_key`. A malformed key is treated like an unknown one.
pub(crate) async fn clinic_for_key(
    clinics: &dyn ClinicRepository,
    raw_key: &str,
) -> Result<Clinic, SubscriptionError> {
    if raw_key.trim().is_empty() {
        return Err(SubscriptionError::validation("license_key", "License key required"));
    }
    let key = LicenseKey::parse(raw_key).map_err(|_| SubscriptionError::InvalidLicense)?;
    clinics
        .find_by_license_key(&key)
        .await?
        .ok_or(SubscriptionError::InvalidLicense)
}
