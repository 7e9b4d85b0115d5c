//! Clinic accounts and their license keys.

mod clinic;
mod license_key;

pub use clinic::{Clinic, NewClinic, PLACEHOLDER_NAME};
pub use license_key::LicenseKey;
