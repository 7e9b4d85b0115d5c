//! RegisterClinicHandler - Direct signup with a chosen plan.
//!
//! FREE signups get an active trial. Paid signups get a pending
//! subscription plus the checkout link that will activate it.

use std::sync::Arc;

use crate::application::handlers::subscription::{
    CreatePendingCommand, CreatePendingHandler, CreateTrialCommand, CreateTrialHandler,
};
use crate::domain::clinic::{Clinic, NewClinic};
use crate::domain::foundation::{normalize_email, Timestamp};
use crate::domain::subscription::{
    BillingCycle, CheckoutLinks, PlanCode, Subscription, SubscriptionError, Tier,
};
use crate::ports::ClinicRepository;

use super::insert_clinic;

#[derive(Debug, Clone, Default)]
pub struct RegisterClinicCommand {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub clinic_name: Option<String>,
    /// `FREE`, `PRO` or `PREMIUM`.
    pub selected_plan: String,
    /// Defaults to monthly for paid plans.
    pub billing_cycle: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegisterClinicResult {
    pub clinic: Clinic,
    pub subscription: Subscription,
    /// Checkout URL for paid plans, when one is configured.
    pub payment_url: Option<String>,
}

pub struct RegisterClinicHandler {
    clinics: Arc<dyn ClinicRepository>,
    create_trial: CreateTrialHandler,
    create_pending: CreatePendingHandler,
    links: CheckoutLinks,
}

impl RegisterClinicHandler {
    pub fn new(
        clinics: Arc<dyn ClinicRepository>,
        create_trial: CreateTrialHandler,
        create_pending: CreatePendingHandler,
        links: CheckoutLinks,
    ) -> Self {
        Self {
            clinics,
            create_trial,
            create_pending,
            links,
        }
    }

    /// # Errors
    ///
    /// - `ValidationFailed` if name, email or plan is missing
    /// - `InvalidPlan` for an unknown tier or cycle
    /// - `EmailAlreadyRegistered` if a clinic already uses the email
    pub async fn handle(
        &self,
        cmd: RegisterClinicCommand,
    ) -> Result<RegisterClinicResult, SubscriptionError> {
        // 1. Validate input
        if [&cmd.name, &cmd.email, &cmd.selected_plan]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(SubscriptionError::validation(
                "body",
                "Missing required fields",
            ));
        }
        let tier = Tier::parse(&cmd.selected_plan)
            .ok_or_else(|| SubscriptionError::invalid_plan(cmd.selected_plan.trim()))?;
        let plan = if tier.is_paid() {
            Some(paid_plan(tier, cmd.billing_cycle.as_deref())?)
        } else {
            None
        };
        let email = normalize_email(&cmd.email)?;

        // 2. Email uniqueness
        if self.clinics.find_by_email(&email).await?.is_some() {
            return Err(SubscriptionError::EmailAlreadyRegistered);
        }

        // 3. Clinic
        let draft = NewClinic {
            name: cmd.name,
            clinic_name: cmd.clinic_name,
            email,
            phone: cmd.phone,
            tier,
        };
        let clinic = insert_clinic(self.clinics.as_ref(), &draft, Timestamp::now()).await?;

        // 4. Subscription, rolling back the clinic on failure
        let created = match plan {
            None => {
                self.create_trial
                    .handle(CreateTrialCommand { clinic_id: clinic.id })
                    .await
            }
            Some(plan) => {
                self.create_pending
                    .handle(CreatePendingCommand {
                        clinic_id: clinic.id,
                        plan,
                    })
                    .await
            }
        };
        let subscription = match created {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!(clinic_id = %clinic.id, error = %err, "subscription creation failed, removing clinic");
                if let Err(rollback) = self.clinics.delete(&clinic.id).await {
                    tracing::error!(clinic_id = %clinic.id, error = %rollback, "clinic rollback failed");
                }
                return Err(err);
            }
        };

        // 5. Checkout link
        let payment_url = plan.and_then(|plan| {
            let url = self.links.url_for(plan, &clinic.id);
            if url.is_none() {
                tracing::warn!(plan = %plan, "no checkout link configured");
            }
            url
        });

        tracing::info!(clinic_id = %clinic.id, tier = %tier, "clinic registered");
        Ok(RegisterClinicResult {
            clinic,
            subscription,
            payment_url,
        })
    }
}

fn paid_plan(tier: Tier, cycle: Option<&str>) -> Result<PlanCode, SubscriptionError> {
    let cycle = match cycle.map(str::trim).filter(|c| !c.is_empty()) {
        None => BillingCycle::Monthly,
        Some(raw) => BillingCycle::parse(raw)
            .ok_or_else(|| SubscriptionError::invalid_plan(format!("{}_{}", tier, raw)))?,
    };
    PlanCode::new(tier, cycle)
        .map_err(|_| SubscriptionError::invalid_plan(format!("{}_{}", tier, cycle)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryClinicRepository, InMemorySubscriptionLedger, InMemorySubscriptionRepository,
    };
    use crate::domain::foundation::Money;
    use crate::domain::subscription::{PriceTable, SubscriptionStatus};
    use crate::ports::{SubscriptionLedger, SubscriptionRepository};

    struct Fixture {
        clinics: Arc<InMemoryClinicRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        handler: RegisterClinicHandler,
    }

    fn fixture() -> Fixture {
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let ledger: Arc<dyn SubscriptionLedger> = Arc::new(InMemorySubscriptionLedger::new());
        let links = CheckoutLinks::default().with_link(
            PlanCode::new(Tier::Pro, BillingCycle::Monthly).unwrap(),
            "https://mpago.la/pro-mensal",
        );
        let handler = RegisterClinicHandler::new(
            clinics.clone(),
            CreateTrialHandler::new(subscriptions.clone(), ledger.clone(), 14),
            CreatePendingHandler::new(subscriptions.clone(), ledger, PriceTable::default()),
            links,
        );
        Fixture {
            clinics,
            subscriptions,
            handler,
        }
    }

    fn command(plan: &str, cycle: Option<&str>) -> RegisterClinicCommand {
        RegisterClinicCommand {
            name: "Dra. Ana".to_string(),
            email: "ana@sorriso.com.br".to_string(),
            phone: Some("11999990000".to_string()),
            clinic_name: Some("Sorriso".to_string()),
            selected_plan: plan.to_string(),
            billing_cycle: cycle.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn free_signup_gets_active_trial_and_no_link() {
        let f = fixture();

        let result = f.handler.handle(command("FREE", None)).await.unwrap();

        assert_eq!(result.clinic.tier, Tier::Free);
        assert_eq!(result.subscription.status, SubscriptionStatus::Active);
        assert_eq!(result.subscription.billing_cycle, Some(BillingCycle::Trial));
        assert!(result.payment_url.is_none());
    }

    #[tokio::test]
    async fn paid_signup_is_pending_with_checkout_link() {
        let f = fixture();

        let result = f.handler.handle(command("PRO", None)).await.unwrap();

        assert_eq!(result.clinic.tier, Tier::Pro);
        assert_eq!(result.subscription.status, SubscriptionStatus::Pending);
        assert_eq!(result.subscription.amount, Money::from_reais(197.0));
        let url = result.payment_url.unwrap();
        assert!(url.starts_with("https://mpago.la/pro-mensal?external_reference="));
        assert!(url.ends_with(&result.clinic.id.to_string()));
    }

    #[tokio::test]
    async fn paid_signup_without_configured_link_still_succeeds() {
        let f = fixture();

        let result = f
            .handler
            .handle(command("PREMIUM", Some("yearly")))
            .await
            .unwrap();

        assert_eq!(result.subscription.amount, Money::from_reais(5367.0));
        assert!(result.payment_url.is_none());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let f = fixture();
        let mut cmd = command("PRO", None);
        cmd.name = "  ".to_string();

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert_eq!(err.message(), "Missing required fields");
        assert!(f.clinics.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let f = fixture();
        f.handler.handle(command("FREE", None)).await.unwrap();

        let mut again = command("PRO", None);
        again.email = " ANA@sorriso.com.br ".to_string();
        let err = f.handler.handle(again).await.unwrap_err();

        assert_eq!(err, SubscriptionError::EmailAlreadyRegistered);
        assert_eq!(f.clinics.len(), 1);
    }

    #[tokio::test]
    async fn unknown_plan_or_cycle_is_invalid() {
        let f = fixture();

        let err = f.handler.handle(command("GOLD", None)).await.unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidPlan(_)));

        let err = f
            .handler
            .handle(command("PRO", Some("weekly")))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidPlan(_)));
        assert!(f.clinics.is_empty());
    }

    #[tokio::test]
    async fn subscription_is_stored_for_new_clinic() {
        let f = fixture();

        let result = f.handler.handle(command("PRO", Some("monthly"))).await.unwrap();

        let stored = f
            .subscriptions
            .find_by_clinic(&result.clinic.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, result.subscription.id);
    }
}
