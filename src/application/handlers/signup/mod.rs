//! Account creation handlers.
//!
//! ## Commands
//!
//! - `RegisterClinicHandler` - Direct signup with a chosen plan
//! - `ProvisionTrialAccountHandler` - Find or create a FREE trial account by email

mod provision_trial_account;
mod register_clinic;

// Commands
pub use provision_trial_account::{
    ProvisionTrialAccountCommand, ProvisionTrialAccountHandler, ProvisionedAccount,
};
pub use register_clinic::{RegisterClinicCommand, RegisterClinicHandler, RegisterClinicResult};

use crate::domain::clinic::{Clinic, LicenseKey, NewClinic};
use crate::domain::foundation::{ClinicId, ErrorCode, Timestamp};
use crate::domain::subscription::SubscriptionError;
use crate::ports::ClinicRepository;

/// Attempts before giving up on license key collisions.
const MAX_KEY_ATTEMPTS: usize = 3;

/// Insert a new verified clinic, regenerating the license key on collision.
pub(crate) async fn insert_clinic(
    clinics: &dyn ClinicRepository,
    draft: &NewClinic,
    now: Timestamp,
) -> Result<Clinic, SubscriptionError> {
    let mut clinic = Clinic::register(ClinicId::new(), draft, LicenseKey::generate(), now)?;
    clinic.verified_at = Some(now);

    for attempt in 1..=MAX_KEY_ATTEMPTS {
        match clinics.insert(&clinic).await {
            Ok(()) => return Ok(clinic),
            Err(err) if err.code == ErrorCode::LicenseKeyConflict && attempt < MAX_KEY_ATTEMPTS => {
                tracing::warn!(attempt, "license key collision, regenerating");
                clinic = clinic.with_license_key(LicenseKey::generate());
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(SubscriptionError::infrastructure(
        "could not allocate a unique license key",
    ))
}
