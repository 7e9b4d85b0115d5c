//! Purchasable plans, their prices and checkout links.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{ClinicId, Money, ValidationError};

use super::{BillingCycle, Tier};

/// A paid (tier, cycle) pair, written `PRO_monthly` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlanCode {
    tier: Tier,
    cycle: BillingCycle,
}

impl PlanCode {
    pub fn new(tier: Tier, cycle: BillingCycle) -> Result<Self, ValidationError> {
        if !tier.is_paid() {
            return Err(ValidationError::invalid_format(
                "plan",
                "FREE is not a purchasable plan",
            ));
        }
        if !cycle.is_billable() {
            return Err(ValidationError::invalid_format(
                "plan",
                format!("'{}' is not a billable cycle", cycle),
            ));
        }
        Ok(Self { tier, cycle })
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn cycle(&self) -> BillingCycle {
        self.cycle
    }

    /// Key used for checkout links, e.g. `upgrade_pro_monthly`.
    pub fn link_key(&self) -> String {
        format!(
            "upgrade_{}_{}",
            self.tier.as_str().to_ascii_lowercase(),
            self.cycle.as_str()
        )
    }
}

impl fmt::Display for PlanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.tier.as_str(), self.cycle.as_str())
    }
}

impl FromStr for PlanCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tier, cycle) = s.trim().split_once('_').ok_or_else(|| {
            ValidationError::invalid_format("plan", format!("expected TIER_cycle, got '{}'", s))
        })?;
        PlanCode::new(tier.parse()?, cycle.parse()?)
    }
}

impl TryFrom<String> for PlanCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlanCode> for String {
    fn from(plan: PlanCode) -> Self {
        plan.to_string()
    }
}

/// Prices per plan plus extra amounts that also identify a plan when a
/// payment arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    prices: HashMap<PlanCode, Money>,
    aliases: HashMap<Money, PlanCode>,
}

impl PriceTable {
    pub fn new(prices: impl IntoIterator<Item = (PlanCode, Money)>) -> Self {
        Self {
            prices: prices.into_iter().collect(),
            aliases: HashMap::new(),
        }
    }

    pub fn with_alias(mut self, amount: Money, plan: PlanCode) -> Self {
        self.aliases.insert(amount, plan);
        self
    }

    pub fn price_for(&self, plan: PlanCode) -> Option<Money> {
        self.prices.get(&plan).copied()
    }

    /// Whether `amount` pays for `plan`, either at its price or an alias.
    pub fn accepts(&self, plan: PlanCode, amount: Money) -> bool {
        self.price_for(plan) == Some(amount) || self.aliases.get(&amount) == Some(&plan)
    }

    /// Exact-amount lookup. Canonical prices win over aliases.
    pub fn plan_for_amount(&self, amount: Money) -> Option<PlanCode> {
        self.prices
            .iter()
            .find(|(_, price)| **price == amount)
            .map(|(plan, _)| *plan)
            .or_else(|| self.aliases.get(&amount).copied())
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        let plan = |tier, cycle| PlanCode { tier, cycle };
        PriceTable::new([
            (plan(Tier::Pro, BillingCycle::Monthly), Money::from_reais(197.0)),
            (plan(Tier::Pro, BillingCycle::Yearly), Money::from_reais(2127.0)),
            (plan(Tier::Premium, BillingCycle::Monthly), Money::from_reais(497.0)),
            (plan(Tier::Premium, BillingCycle::Yearly), Money::from_reais(5367.0)),
        ])
        .with_alias(Money::from_reais(1970.0), plan(Tier::Pro, BillingCycle::Yearly))
        .with_alias(Money::from_reais(2128.0), plan(Tier::Pro, BillingCycle::Yearly))
        .with_alias(Money::from_reais(4970.0), plan(Tier::Premium, BillingCycle::Yearly))
        .with_alias(Money::from_reais(3790.0), plan(Tier::Premium, BillingCycle::Yearly))
    }
}

/// Hosted checkout URLs per plan. The clinic id travels as
/// `external_reference` so the payment webhook can find the clinic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutLinks {
    links: HashMap<PlanCode, String>,
}

impl CheckoutLinks {
    pub fn with_link(mut self, plan: PlanCode, url: impl Into<String>) -> Self {
        self.links.insert(plan, url.into());
        self
    }

    pub fn url_for(&self, plan: PlanCode, clinic_id: &ClinicId) -> Option<String> {
        self.links.get(&plan).map(|base| {
            let sep = if base.contains('?') { '&' } else { '?' };
            format!("{}{}external_reference={}", base, sep, clinic_id)
        })
    }

    pub fn plans(&self) -> Vec<PlanCode> {
        self.links.keys().copied().collect()
    }

    /// Every configured link, keyed by [`PlanCode::link_key`].
    pub fn all_for(&self, clinic_id: &ClinicId) -> Vec<(String, String)> {
        let mut links: Vec<(String, String)> = self
            .links
            .keys()
            .filter_map(|plan| Some((plan.link_key(), self.url_for(*plan, clinic_id)?)))
            .collect();
        links.sort();
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plan(tier: Tier, cycle: BillingCycle) -> PlanCode {
        PlanCode::new(tier, cycle).unwrap()
    }

    #[test]
    fn plan_code_parses_and_displays() {
        let code: PlanCode = "PRO_monthly".parse().unwrap();
        assert_eq!(code, plan(Tier::Pro, BillingCycle::Monthly));
        assert_eq!(code.to_string(), "PRO_monthly");
        assert_eq!(code.link_key(), "upgrade_pro_monthly");

        let code: PlanCode = "premium_YEARLY".parse().unwrap();
        assert_eq!(code.to_string(), "PREMIUM_yearly");
    }

    #[test]
    fn plan_code_rejects_free_and_trial() {
        assert!("FREE_monthly".parse::<PlanCode>().is_err());
        assert!("PRO_trial".parse::<PlanCode>().is_err());
        assert!("PRO".parse::<PlanCode>().is_err());
    }

    #[test]
    fn default_table_maps_monthly_amounts() {
        let table = PriceTable::default();
        assert_eq!(
            table.plan_for_amount(Money::from_reais(197.0)),
            Some(plan(Tier::Pro, BillingCycle::Monthly))
        );
        assert_eq!(
            table.plan_for_amount(Money::from_reais(497.0)),
            Some(plan(Tier::Premium, BillingCycle::Monthly))
        );
        assert_eq!(table.plan_for_amount(Money::from_reais(123.0)), None);
    }

    #[test]
    fn default_table_accepts_legacy_yearly_amounts() {
        let table = PriceTable::default();
        for amount in [1970.0, 2127.0, 2128.0] {
            assert_eq!(
                table.plan_for_amount(Money::from_reais(amount)),
                Some(plan(Tier::Pro, BillingCycle::Yearly))
            );
        }
        for amount in [3790.0, 4970.0, 5367.0] {
            assert_eq!(
                table.plan_for_amount(Money::from_reais(amount)),
                Some(plan(Tier::Premium, BillingCycle::Yearly))
            );
        }
    }

    #[test]
    fn canonical_price_wins_over_alias() {
        let pro = plan(Tier::Pro, BillingCycle::Monthly);
        let premium = plan(Tier::Premium, BillingCycle::Monthly);
        let table = PriceTable::new([(pro, Money::from_reais(100.0))])
            .with_alias(Money::from_reais(100.0), premium);
        assert_eq!(table.plan_for_amount(Money::from_reais(100.0)), Some(pro));
    }

    #[test]
    fn accepts_only_amounts_of_that_plan() {
        let table = PriceTable::default();
        let pro_yearly = plan(Tier::Pro, BillingCycle::Yearly);
        let premium_yearly = plan(Tier::Premium, BillingCycle::Yearly);

        assert!(table.accepts(pro_yearly, Money::from_reais(2127.0)));
        assert!(table.accepts(pro_yearly, Money::from_reais(1970.0)));
        assert!(table.accepts(premium_yearly, Money::from_reais(3790.0)));
        assert!(!table.accepts(premium_yearly, Money::from_reais(2127.0)));
        assert!(!table.accepts(premium_yearly, Money::from_reais(1.0)));
    }

    #[test]
    fn checkout_link_appends_reference() {
        let clinic = ClinicId::new();
        let pro = plan(Tier::Pro, BillingCycle::Monthly);
        let links = CheckoutLinks::default()
            .with_link(pro, "https://mpago.la/abc")
            .with_link(plan(Tier::Pro, BillingCycle::Yearly), "https://pay.example/x?src=site");

        assert_eq!(
            links.url_for(pro, &clinic).unwrap(),
            format!("https://mpago.la/abc?external_reference={}", clinic)
        );
        let all = links.all_for(&clinic);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].0, "upgrade_pro_yearly");
        assert!(all[1].1.contains("?src=site&external_reference="));
    }

    proptest! {
        #[test]
        fn every_priced_plan_resolves_to_itself(
            pro_m in 1i64..100_000,
            pro_y in 100_000i64..200_000,
            prem_m in 200_000i64..300_000,
            prem_y in 300_000i64..400_000,
        ) {
            let entries = [
                (plan(Tier::Pro, BillingCycle::Monthly), Money::from_cents(pro_m)),
                (plan(Tier::Pro, BillingCycle::Yearly), Money::from_cents(pro_y)),
                (plan(Tier::Premium, BillingCycle::Monthly), Money::from_cents(prem_m)),
                (plan(Tier::Premium, BillingCycle::Yearly), Money::from_cents(prem_y)),
            ];
            let table = PriceTable::new(entries);
            for (code, price) in entries {
                prop_assert_eq!(table.price_for(code), Some(price));
                prop_assert_eq!(table.plan_for_amount(price), Some(code));
            }
        }
    }
}
