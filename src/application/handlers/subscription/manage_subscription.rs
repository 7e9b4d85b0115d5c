//! ManageSubscriptionHandler - Self-service actions for a clinic owner.
//!
//! The caller proves ownership with email plus license key. `get_info`
//! returns the current plan and checkout links; `downgrade` queues a change
//! for the end of the current period.

use std::sync::Arc;

use crate::domain::clinic::{Clinic, LicenseKey};
use crate::domain::foundation::normalize_email;
use crate::domain::subscription::{
    BillingCycle, CheckoutLinks, Subscription, SubscriptionError, Tier,
};
use crate::ports::{ClinicRepository, SubscriptionRepository};

use super::{ScheduleChangeCommand, ScheduleChangeHandler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageAction {
    GetInfo,
    Downgrade {
        new_tier: Tier,
        new_billing_cycle: Option<BillingCycle>,
    },
}

impl ManageAction {
    /// Parse the wire `action` with its optional downgrade target.
    pub fn parse(
        action: Option<&str>,
        new_tier: Option<&str>,
        new_billing_cycle: Option<&str>,
    ) -> Result<Self, SubscriptionError> {
        match action.map(str::trim) {
            Some("get_info") => Ok(ManageAction::GetInfo),
            Some("downgrade") => {
                let raw_tier = new_tier
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        SubscriptionError::validation("new_tier", "New tier is required for downgrade")
                    })?;
                let tier: Tier = raw_tier.parse()?;
                let cycle = new_billing_cycle
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::parse::<BillingCycle>)
                    .transpose()?;
                Ok(ManageAction::Downgrade {
                    new_tier: tier,
                    new_billing_cycle: cycle,
                })
            }
            _ => Err(SubscriptionError::validation("action", "Invalid action")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManageSubscriptionCommand {
    pub email: String,
    pub license_key: String,
    pub action: ManageAction,
}

#[derive(Debug, Clone)]
pub struct SubscriptionInfo {
    pub clinic: Clinic,
    /// `None` for clinics that never had a subscription row.
    pub subscription: Option<Subscription>,
    /// `(link_key, url)` pairs, e.g. `upgrade_pro_monthly`.
    pub links: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub enum ManageSubscriptionResult {
    Info(SubscriptionInfo),
    Scheduled {
        subscription: Subscription,
        message: String,
    },
}

pub struct ManageSubscriptionHandler {
    clinics: Arc<dyn ClinicRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    schedule: ScheduleChangeHandler,
    links: CheckoutLinks,
}

impl ManageSubscriptionHandler {
    pub fn new(
        clinics: Arc<dyn ClinicRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        schedule: ScheduleChangeHandler,
        links: CheckoutLinks,
    ) -> Self {
        Self {
            clinics,
            subscriptions,
            schedule,
            links,
        }
    }

    pub async fn handle(
        &self,
        cmd: ManageSubscriptionCommand,
    ) -> Result<ManageSubscriptionResult, SubscriptionError> {
        // 1. Authenticate
        let clinic = self.authenticate(&cmd.email, &cmd.license_key).await?;

        // 2. Dispatch
        match cmd.action {
            ManageAction::GetInfo => {
                let subscription = self.subscriptions.find_by_clinic(&clinic.id).await?;
                let links = self.links.all_for(&clinic.id);
                Ok(ManageSubscriptionResult::Info(SubscriptionInfo {
                    clinic,
                    subscription,
                    links,
                }))
            }
            ManageAction::Downgrade {
                new_tier,
                new_billing_cycle,
            } => {
                // Moving up a tier needs a payment, so it goes through checkout.
                if let Some(current) = self.subscriptions.find_by_clinic(&clinic.id).await? {
                    if new_tier.rank() > current.tier.rank() {
                        tracing::warn!(
                            clinic_id = %clinic.id,
                            current_tier = %current.tier,
                            requested_tier = %new_tier,
                            "refusing upgrade through downgrade action"
                        );
                        return Err(SubscriptionError::invalid_plan(format!(
                            "{} is above the current {} plan",
                            new_tier, current.tier
                        )));
                    }
                }

                let subscription = self
                    .schedule
                    .handle(ScheduleChangeCommand {
                        clinic_id: clinic.id,
                        next_tier: new_tier,
                        next_billing_cycle: new_billing_cycle,
                    })
                    .await?;
                Ok(ManageSubscriptionResult::Scheduled {
                    subscription,
                    message: format!(
                        "Seu plano será alterado para {} no próximo ciclo de faturamento.",
                        new_tier
                    ),
                })
            }
        }
    }

    async fn authenticate(&self, email: &str, license_key: &str) -> Result<Clinic, SubscriptionError> {
        if email.trim().is_empty() || license_key.trim().is_empty() {
            return Err(SubscriptionError::validation(
                "email",
                "Email and license key are required",
            ));
        }

        let email = normalize_email(email).map_err(|_| SubscriptionError::InvalidCredentials)?;
        let key = LicenseKey::parse(license_key).map_err(|_| SubscriptionError::InvalidCredentials)?;

        match self.clinics.find_by_license_key(&key).await? {
            Some(clinic) if clinic.email == email => Ok(clinic),
            _ => Err(SubscriptionError::InvalidCredentials),
        }
    }
}
