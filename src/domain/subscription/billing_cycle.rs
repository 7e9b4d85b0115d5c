//! Billing cycles and period arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    Trial,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
            BillingCycle::Trial => "trial",
        }
    }

    pub fn parse(raw: &str) -> Option<BillingCycle> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(BillingCycle::Monthly),
            "yearly" | "annual" => Some(BillingCycle::Yearly),
            "trial" => Some(BillingCycle::Trial),
            _ => None,
        }
    }

    /// Cycles that can be purchased.
    pub fn is_billable(&self) -> bool {
        matches!(self, BillingCycle::Monthly | BillingCycle::Yearly)
    }

    /// End of a paid period starting at `start`: one year for yearly, one
    /// calendar month for everything else.
    pub fn period_end_from(&self, start: Timestamp) -> Timestamp {
        match self {
            BillingCycle::Yearly => start.add_years(1),
            BillingCycle::Monthly | BillingCycle::Trial => start.add_months(1),
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BillingCycle::parse(s).ok_or_else(|| {
            ValidationError::invalid_format("billing_cycle", format!("unknown cycle '{}'", s))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap())
    }

    #[test]
    fn monthly_period_is_one_calendar_month() {
        assert_eq!(
            BillingCycle::Monthly.period_end_from(at(2024, 3, 31)),
            at(2024, 4, 30)
        );
    }

    #[test]
    fn yearly_period_is_one_year() {
        assert_eq!(
            BillingCycle::Yearly.period_end_from(at(2024, 6, 1)),
            at(2025, 6, 1)
        );
    }

    #[test]
    fn parse_accepts_annual_alias() {
        assert_eq!(BillingCycle::parse("ANNUAL"), Some(BillingCycle::Yearly));
        assert_eq!(BillingCycle::parse("weekly"), None);
    }

    #[test]
    fn only_monthly_and_yearly_are_billable() {
        assert!(BillingCycle::Monthly.is_billable());
        assert!(BillingCycle::Yearly.is_billable());
        assert!(!BillingCycle::Trial.is_billable());
    }
}
