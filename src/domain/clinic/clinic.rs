//! Clinic account entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{normalize_email, ClinicId, Timestamp, ValidationError};
use crate::domain::subscription::Tier;

use super::LicenseKey;

/// Name given to clinics created before the owner tells us theirs.
pub const PLACEHOLDER_NAME: &str = "Usuário";

/// One customer account. `tier` mirrors the subscription and is rewritten
/// whenever the subscription's tier changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clinic {
    pub id: ClinicId,
    pub name: String,
    pub clinic_name: Option<String>,
    /// Always trimmed and lowercased.
    pub email: String,
    pub phone: Option<String>,
    pub license_key: LicenseKey,
    pub tier: Tier,
    pub doctor_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub verified_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Registration details for a clinic that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClinic {
    pub name: String,
    pub clinic_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub tier: Tier,
}

impl NewClinic {
    /// Placeholder account created from nothing but an email.
    pub fn from_email(email: impl Into<String>) -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            clinic_name: None,
            email: email.into(),
            phone: None,
            tier: Tier::Free,
        }
    }
}

impl Clinic {
    /// Validate and normalize a registration into a clinic holding `license_key`.
    pub fn register(
        id: ClinicId,
        draft: &NewClinic,
        license_key: LicenseKey,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }

        Ok(Self {
            id,
            name: name.to_string(),
            clinic_name: non_blank(draft.clinic_name.as_deref()),
            email: normalize_email(&draft.email)?,
            phone: non_blank(draft.phone.as_deref()),
            license_key,
            tier: draft.tier,
            doctor_name: None,
            profile_picture_url: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Swap in a fresh key after a uniqueness conflict. Only meaningful
    /// before the clinic is stored; stored keys never change.
    pub fn with_license_key(mut self, license_key: LicenseKey) -> Self {
        self.license_key = license_key;
        self
    }

    /// Name shown to the desktop client.
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            &self.name
        } else {
            self.clinic_name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("User")
        }
    }

    pub fn set_tier(&mut self, tier: Tier, now: Timestamp) {
        self.tier = tier;
        self.updated_at = now;
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewClinic {
        NewClinic {
            name: "  Dra. Ana Souza ".to_string(),
            clinic_name: Some("Sorriso Feliz".to_string()),
            email: "Ana@SorrisoFeliz.com.br".to_string(),
            phone: Some("   ".to_string()),
            tier: Tier::Pro,
        }
    }

    #[test]
    fn register_normalizes_fields() {
        let clinic = Clinic::register(
            ClinicId::new(),
            &draft(),
            LicenseKey::generate(),
            Timestamp::now(),
        )
        .unwrap();

        assert_eq!(clinic.name, "Dra. Ana Souza");
        assert_eq!(clinic.email, "ana@sorrisofeliz.com.br");
        assert!(clinic.phone.is_none());
        assert_eq!(clinic.tier, Tier::Pro);
    }

    #[test]
    fn register_requires_name_and_valid_email() {
        let mut missing_name = draft();
        missing_name.name = " ".to_string();
        assert!(Clinic::register(
            ClinicId::new(),
            &missing_name,
            LicenseKey::generate(),
            Timestamp::now()
        )
        .is_err());

        let mut bad_email = draft();
        bad_email.email = "ana".to_string();
        assert!(Clinic::register(
            ClinicId::new(),
            &bad_email,
            LicenseKey::generate(),
            Timestamp::now()
        )
        .is_err());
    }

    #[test]
    fn placeholder_clinic_is_free() {
        let draft = NewClinic::from_email("x@y.com");
        assert_eq!(draft.name, PLACEHOLDER_NAME);
        assert_eq!(draft.tier, Tier::Free);
    }

    #[test]
    fn display_name_falls_back() {
        let mut clinic = Clinic::register(
            ClinicId::new(),
            &draft(),
            LicenseKey::generate(),
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(clinic.display_name(), "Dra. Ana Souza");

        clinic.name = String::new();
        assert_eq!(clinic.display_name(), "Sorriso Feliz");

        clinic.clinic_name = None;
        assert_eq!(clinic.display_name(), "User");
    }

    #[test]
    fn set_tier_touches_updated_at() {
        let created = Timestamp::now().minus_days(3);
        let mut clinic =
            Clinic::register(ClinicId::new(), &draft(), LicenseKey::generate(), created).unwrap();

        let now = Timestamp::now();
        clinic.set_tier(Tier::Premium, now);
        assert_eq!(clinic.tier, Tier::Premium);
        assert_eq!(clinic.updated_at, now);
        assert_eq!(clinic.created_at, created);
    }
}
