//! Admin dashboard rollups.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{LeadId, Timestamp, ValidationError};

use super::{Lead, LeadStatus};

/// Look-back window for the dashboard, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPeriod(u32);

impl ReportingPeriod {
    pub const DEFAULT_DAYS: u32 = 30;
    pub const MAX_DAYS: u32 = 365;

    pub fn days(days: u32) -> Result<Self, ValidationError> {
        if days == 0 || days > Self::MAX_DAYS {
            return Err(ValidationError::out_of_range(
                "period",
                1,
                Self::MAX_DAYS as i64,
                days as i64,
            ));
        }
        Ok(Self(days))
    }

    /// Parses the `period` query value, falling back to the default when absent.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::default()),
            Some(s) => {
                let days = s
                    .parse::<u32>()
                    .map_err(|_| ValidationError::invalid_format("period", "must be a number of days"))?;
                Self::days(days)
            }
        }
    }

    pub fn as_days(&self) -> u32 {
        self.0
    }

    pub fn since(&self, now: Timestamp) -> Timestamp {
        now.minus_days(self.0 as i64)
    }
}

impl Default for ReportingPeriod {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}

/// Raw counts for a reporting window, as read from storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunnelCounts {
    pub page_views: u64,
    pub unique_sessions: u64,
    pub leads: u64,
    pub completed_leads: u64,
    pub downloads: u64,
    pub free_downloads: u64,
    /// Plan type `professional` or `pro`.
    pub professional_downloads: u64,
    pub premium_downloads: u64,
    pub payments_initiated: u64,
    pub payments_completed: u64,
    /// Sum of completed payment amounts, in reais.
    pub revenue: f64,
}

/// Lead row as the dashboard lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadSummary {
    pub id: LeadId,
    pub session_id: String,
    pub status: LeadStatus,
    pub name: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub clinic_name: Option<String>,
    pub lost_revenue: Option<f64>,
    pub abandoned_at_step: Option<i16>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl From<&Lead> for LeadSummary {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id,
            session_id: lead.session_id.clone(),
            status: lead.status,
            name: lead.contact.name.clone(),
            email: lead.contact.email.clone(),
            whatsapp: lead.contact.whatsapp.clone(),
            clinic_name: lead.contact.clinic_name.clone(),
            lost_revenue: lead.calculator.lost_revenue,
            abandoned_at_step: lead.abandoned_at_step,
            created_at: lead.created_at,
            completed_at: lead.completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_visitors: u64,
    pub unique_visitors: u64,
    pub total_leads: u64,
    pub completed_leads: u64,
    pub abandoned_leads: u64,
    pub total_downloads: u64,
    pub free_downloads: u64,
    pub professional_downloads: u64,
    pub premium_downloads: u64,
    pub payments_initiated: u64,
    pub payments_completed: u64,
    /// Two decimals, e.g. `"694.00"`.
    pub total_revenue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRates {
    pub visitor_to_lead: String,
    pub lead_to_download: String,
    pub download_to_payment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub period_days: u32,
    pub overview: Overview,
    pub conversion_rates: ConversionRates,
    pub recent_leads: Vec<LeadSummary>,
    pub abandoned_leads: Vec<LeadSummary>,
}

impl AnalyticsOverview {
    pub fn build(
        period: ReportingPeriod,
        counts: &FunnelCounts,
        recent_leads: Vec<LeadSummary>,
        abandoned_leads: Vec<LeadSummary>,
    ) -> Self {
        let abandoned = counts.leads.saturating_sub(counts.completed_leads);
        Self {
            period_days: period.as_days(),
            overview: Overview {
                total_visitors: counts.page_views,
                unique_visitors: counts.unique_sessions,
                total_leads: counts.leads,
                completed_leads: counts.completed_leads,
                abandoned_leads: abandoned,
                total_downloads: counts.downloads,
                free_downloads: counts.free_downloads,
                professional_downloads: counts.professional_downloads,
                premium_downloads: counts.premium_downloads,
                payments_initiated: counts.payments_initiated,
                payments_completed: counts.payments_completed,
                total_revenue: format!("{:.2}", counts.revenue),
            },
            conversion_rates: ConversionRates {
                visitor_to_lead: percent(counts.completed_leads, counts.unique_sessions),
                lead_to_download: percent(counts.downloads, counts.completed_leads),
                download_to_payment: percent(counts.payments_completed, counts.downloads),
            },
            recent_leads,
            abandoned_leads,
        }
    }
}

/// One-decimal percentage; `"0.0"` when the denominator is zero.
fn percent(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", numerator as f64 / denominator as f64 * 100.0)
}

/// Plan type buckets used for download counts.
pub fn download_bucket(plan_type: &str) -> &'static str {
    match plan_type.trim().to_lowercase().as_str() {
        "professional" | "pro" => "professional",
        "premium" => "premium",
        _ => "free",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_guard_against_zero() {
        let overview = AnalyticsOverview::build(
            ReportingPeriod::default(),
            &FunnelCounts::default(),
            vec![],
            vec![],
        );
        assert_eq!(overview.conversion_rates.visitor_to_lead, "0.0");
        assert_eq!(overview.conversion_rates.download_to_payment, "0.0");
        assert_eq!(overview.overview.total_revenue, "0.00");
    }

    #[test]
    fn rates_round_to_one_decimal() {
        let counts = FunnelCounts {
            page_views: 900,
            unique_sessions: 300,
            leads: 40,
            completed_leads: 25,
            downloads: 20,
            payments_completed: 3,
            revenue: 694.0,
            ..Default::default()
        };
        let overview = AnalyticsOverview::build(ReportingPeriod::default(), &counts, vec![], vec![]);

        assert_eq!(overview.overview.abandoned_leads, 15);
        assert_eq!(overview.conversion_rates.visitor_to_lead, "8.3");
        assert_eq!(overview.conversion_rates.lead_to_download, "80.0");
        assert_eq!(overview.conversion_rates.download_to_payment, "15.0");
        assert_eq!(overview.overview.total_revenue, "694.00");
    }

    #[test]
    fn serializes_camel_case() {
        let overview = AnalyticsOverview::build(
            ReportingPeriod::default(),
            &FunnelCounts::default(),
            vec![],
            vec![],
        );
        let json = serde_json::to_value(&overview).unwrap();
        assert!(json["overview"]["totalVisitors"].is_number());
        assert!(json["conversionRates"]["visitorToLead"].is_string());
        assert!(json["recentLeads"].is_array());
    }

    #[test]
    fn period_parsing() {
        assert_eq!(ReportingPeriod::parse(None).unwrap().as_days(), 30);
        assert_eq!(ReportingPeriod::parse(Some("7")).unwrap().as_days(), 7);
        assert!(ReportingPeriod::parse(Some("0")).is_err());
        assert!(ReportingPeriod::parse(Some("366")).is_err());
        assert!(ReportingPeriod::parse(Some("week")).is_err());
    }

    #[test]
    fn download_buckets() {
        assert_eq!(download_bucket("pro"), "professional");
        assert_eq!(download_bucket("Professional"), "professional");
        assert_eq!(download_bucket("premium"), "premium");
        assert_eq!(download_bucket("anything"), "free");
    }
}
