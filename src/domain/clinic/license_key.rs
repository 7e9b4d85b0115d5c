//! License keys issued to clinics.
//!
//! Format: `LKRP-XXXX-XXXX-XXXX`, twelve uppercase hex digits drawn from 48
//! bits of OS randomness. Uniqueness is enforced by storage; callers retry
//! with a fresh key on conflict.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

const PREFIX: &str = "LKRP";
const GROUPS: usize = 3;
const GROUP_LEN: usize = 4;
const KEY_BYTES: usize = GROUPS * GROUP_LEN / 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseKey(String);

impl LicenseKey {
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        rng.fill_bytes(&mut bytes);
        let digits = hex::encode_upper(bytes);

        let mut key = String::with_capacity(PREFIX.len() + GROUPS * (GROUP_LEN + 1));
        key.push_str(PREFIX);
        for group in digits.as_bytes().chunks(GROUP_LEN) {
            key.push('-');
            key.extend(group.iter().map(|b| *b as char));
        }
        Self(key)
    }

    /// Parses user input. Case and surrounding whitespace are forgiven.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let key = raw.trim().to_ascii_uppercase();
        if key.is_empty() {
            return Err(ValidationError::empty_field("license_key"));
        }
        if !Self::is_well_formed(&key) {
            return Err(ValidationError::invalid_format(
                "license_key",
                "expected LKRP-XXXX-XXXX-XXXX",
            ));
        }
        Ok(Self(key))
    }

    pub fn is_well_formed(candidate: &str) -> bool {
        let mut parts = candidate.split('-');
        if parts.next() != Some(PREFIX) {
            return false;
        }
        let groups: Vec<&str> = parts.collect();
        groups.len() == GROUPS
            && groups.iter().all(|g| {
                g.len() == GROUP_LEN
                    && g.chars()
                        .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LicenseKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LicenseKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LicenseKey> for String {
    fn from(key: LicenseKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn generated_key_matches_format() {
        let key = LicenseKey::generate();
        assert!(LicenseKey::is_well_formed(key.as_str()), "{}", key);
        assert_eq!(key.as_str().len(), "LKRP-XXXX-XXXX-XXXX".len());
    }

    #[test]
    fn ten_thousand_keys_are_distinct() {
        let keys: HashSet<LicenseKey> = (0..10_000).map(|_| LicenseKey::generate()).collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = LicenseKey::generate_with(&mut StdRng::seed_from_u64(7));
        let b = LicenseKey::generate_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let key = LicenseKey::parse("  lkrp-00ab-cdef-1234 ").unwrap();
        assert_eq!(key.as_str(), "LKRP-00AB-CDEF-1234");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(LicenseKey::parse("").is_err());
        assert!(LicenseKey::parse("LKRP-00AB-CDEF").is_err());
        assert!(LicenseKey::parse("ABCD-00AB-CDEF-1234").is_err());
        assert!(LicenseKey::parse("LKRP-00AG-CDEF-1234").is_err());
        assert!(LicenseKey::parse("LKRP-00AB-CDEF-12345").is_err());
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<LicenseKey>("\"nope\"").is_err());
        let key: LicenseKey = serde_json::from_str("\"LKRP-0000-1111-2222\"").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"LKRP-0000-1111-2222\"");
    }

    proptest! {
        #[test]
        fn any_seed_produces_well_formed_key(seed in any::<u64>()) {
            let key = LicenseKey::generate_with(&mut StdRng::seed_from_u64(seed));
            prop_assert!(LicenseKey::is_well_formed(key.as_str()));
            prop_assert_eq!(LicenseKey::parse(key.as_str()).unwrap(), key);
        }
    }
}
