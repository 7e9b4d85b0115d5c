//! Subscription tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription tier. Serialized as the uppercase names the desktop client
/// and the database use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Free,
    Pro,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Pro, Tier::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "FREE",
            Tier::Pro => "PRO",
            Tier::Premium => "PREMIUM",
        }
    }

    /// Lenient parse: case-insensitive, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Option<Tier> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "FREE" => Some(Tier::Free),
            "PRO" | "PROFESSIONAL" => Some(Tier::Pro),
            "PREMIUM" => Some(Tier::Premium),
            _ => None,
        }
    }

    /// Unknown tier names fall back to FREE.
    pub fn parse_or_free(raw: &str) -> Tier {
        Tier::parse(raw).unwrap_or(Tier::Free)
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Tier::Free)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Pro => "Pro",
            Tier::Premium => "Premium",
        }
    }

    /// Higher rank = more features.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Free => 0,
            Tier::Pro => 1,
            Tier::Premium => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::parse(s).ok_or_else(|| {
            ValidationError::invalid_format("tier", format!("unknown tier '{}'", s))
        })
    }
}
