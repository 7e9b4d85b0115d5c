//! Billing configuration: prices, entitlement limits, trial length and the
//! period sweeper.

use serde::Deserialize;
use std::time::Duration;

use crate::domain::foundation::Money;
use crate::domain::subscription::{
    BillingCycle, EntitlementTable, Features, PlanCode, PriceTable, Tier,
};

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_pro_monthly_price")]
    pub pro_monthly_price: f64,

    #[serde(default = "default_pro_yearly_price")]
    pub pro_yearly_price: f64,

    #[serde(default = "default_premium_monthly_price")]
    pub premium_monthly_price: f64,

    #[serde(default = "default_premium_yearly_price")]
    pub premium_yearly_price: f64,

    /// Comma-separated legacy amounts also accepted as PRO yearly payments
    #[serde(default = "default_pro_yearly_aliases")]
    pub pro_yearly_aliases: String,

    /// Comma-separated legacy amounts also accepted as PREMIUM yearly payments
    #[serde(default = "default_premium_yearly_aliases")]
    pub premium_yearly_aliases: String,

    #[serde(default = "default_trial_days")]
    pub trial_days: u32,

    /// Interval of the background period sweeper; 0 leaves transitions to
    /// license verification alone.
    #[serde(default)]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_free_daily_messages")]
    pub free_daily_messages: u32,

    #[serde(default = "default_free_monthly_messages")]
    pub free_monthly_messages: u32,

    #[serde(default = "default_pro_daily_messages")]
    pub pro_daily_messages: u32,

    #[serde(default = "default_pro_monthly_messages")]
    pub pro_monthly_messages: u32,

    #[serde(default = "default_pro_ai_daily")]
    pub pro_ai_daily: u32,

    #[serde(default = "default_pro_ai_monthly")]
    pub pro_ai_monthly: u32,

    #[serde(default = "default_premium_ai_daily")]
    pub premium_ai_daily: u32,

    #[serde(default = "default_premium_ai_monthly")]
    pub premium_ai_monthly: u32,
}

impl BillingConfig {
    /// Canonical prices plus legacy aliases
    pub fn price_table(&self) -> Result<PriceTable, ValidationError> {
        let plan = |tier, cycle| {
            PlanCode::new(tier, cycle).map_err(|_| ValidationError::InvalidPrice("plan"))
        };
        let pro_yearly = plan(Tier::Pro, BillingCycle::Yearly)?;
        let premium_yearly = plan(Tier::Premium, BillingCycle::Yearly)?;

        let mut table = PriceTable::new([
            (plan(Tier::Pro, BillingCycle::Monthly)?, Money::from_reais(self.pro_monthly_price)),
            (pro_yearly, Money::from_reais(self.pro_yearly_price)),
            (plan(Tier::Premium, BillingCycle::Monthly)?, Money::from_reais(self.premium_monthly_price)),
            (premium_yearly, Money::from_reais(self.premium_yearly_price)),
        ]);

        for amount in parse_aliases(&self.pro_yearly_aliases)? {
            table = table.with_alias(amount, pro_yearly);
        }
        for amount in parse_aliases(&self.premium_yearly_aliases)? {
            table = table.with_alias(amount, premium_yearly);
        }

        Ok(table)
    }

    pub fn entitlements(&self) -> EntitlementTable {
        let free = Features {
            daily_message_limit: Some(self.free_daily_messages),
            monthly_message_limit: Some(self.free_monthly_messages),
            ..Features::free()
        };
        let pro = Features {
            daily_message_limit: Some(self.pro_daily_messages),
            monthly_message_limit: Some(self.pro_monthly_messages),
            ai_daily_limit: self.pro_ai_daily,
            ai_monthly_limit: self.pro_ai_monthly,
            ..Features::pro()
        };
        let premium = Features {
            ai_daily_limit: self.premium_ai_daily,
            ai_monthly_limit: self.premium_ai_monthly,
            ..Features::premium()
        };
        EntitlementTable::new(free, pro, premium)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let prices = [
            ("BILLING__PRO_MONTHLY_PRICE", self.pro_monthly_price),
            ("BILLING__PRO_YEARLY_PRICE", self.pro_yearly_price),
            ("BILLING__PREMIUM_MONTHLY_PRICE", self.premium_monthly_price),
            ("BILLING__PREMIUM_YEARLY_PRICE", self.premium_yearly_price),
        ];
        for (name, price) in prices {
            if !price.is_finite() || price <= 0.0 {
                return Err(ValidationError::InvalidPrice(name));
            }
        }
        if self.trial_days == 0 || self.trial_days > 90 {
            return Err(ValidationError::InvalidTrialDays);
        }
        self.price_table()?;
        Ok(())
    }
}

fn parse_aliases(raw: &str) -> Result<Vec<Money>, ValidationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(Money::from_reais(v)),
            _ => Err(ValidationError::InvalidPriceAlias(s.to_string())),
        })
        .collect()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            pro_monthly_price: default_pro_monthly_price(),
            pro_yearly_price: default_pro_yearly_price(),
            premium_monthly_price: default_premium_monthly_price(),
            premium_yearly_price: default_premium_yearly_price(),
            pro_yearly_aliases: default_pro_yearly_aliases(),
            premium_yearly_aliases: default_premium_yearly_aliases(),
            trial_days: default_trial_days(),
            sweep_interval_secs: 0,
            free_daily_messages: default_free_daily_messages(),
            free_monthly_messages: default_free_monthly_messages(),
            pro_daily_messages: default_pro_daily_messages(),
            pro_monthly_messages: default_pro_monthly_messages(),
            pro_ai_daily: default_pro_ai_daily(),
            pro_ai_monthly: default_pro_ai_monthly(),
            premium_ai_daily: default_premium_ai_daily(),
            premium_ai_monthly: default_premium_ai_monthly(),
        }
    }
}

fn default_pro_monthly_price() -> f64 {
    197.0
}

fn default_pro_yearly_price() -> f64 {
    2127.0
}

fn default_premium_monthly_price() -> f64 {
    497.0
}

fn default_premium_yearly_price() -> f64 {
    5367.0
}

fn default_pro_yearly_aliases() -> String {
    "1970,2128".to_string()
}

fn default_premium_yearly_aliases() -> String {
    "4970,3790".to_string()
}

fn default_trial_days() -> u32 {
    14
}

fn default_free_daily_messages() -> u32 {
    10
}

fn default_free_monthly_messages() -> u32 {
    300
}

fn default_pro_daily_messages() -> u32 {
    50
}

fn default_pro_monthly_messages() -> u32 {
    500
}

fn default_pro_ai_daily() -> u32 {
    5
}

fn default_pro_ai_monthly() -> u32 {
    50
}

fn default_premium_ai_daily() -> u32 {
    20
}

fn default_premium_ai_monthly() -> u32 {
    200
}
