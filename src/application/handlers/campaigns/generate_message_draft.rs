//! GenerateMessageDraftHandler - Drafts a WhatsApp message with the LLM.
//!
//! Only PRO and PREMIUM licenses may draft. Each successful draft consumes
//! one `ai_generations` slot; daily and monthly limits come from the
//! entitlement table. A slot is only consumed after the model returns text.

use std::sync::Arc;

use crate::application::handlers::license::{VerifyLicenseCommand, VerifyLicenseHandler};
use crate::domain::campaign::{DraftPrompt, DraftRequest, Tone};
use crate::domain::subscription::SubscriptionError;
use crate::domain::usage::{UsageIncrement, UsageKind};
use crate::ports::{DraftError, MessageDrafter, UsageCounter};

#[derive(Debug, Clone)]
pub struct GenerateMessageDraftCommand {
    /// Path parameter; drafts are not stored against the campaign.
    pub campaign_id: String,
    pub license_key: String,
    pub prompt: String,
    pub tone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateMessageDraftResult {
    pub generated_text: String,
    pub usage_today: u32,
    pub daily_limit: u32,
    pub remaining_today: u32,
}

pub struct GenerateMessageDraftHandler {
    verify: VerifyLicenseHandler,
    drafter: Arc<dyn MessageDrafter>,
    usage: Arc<dyn UsageCounter>,
}

impl GenerateMessageDraftHandler {
    pub fn new(
        verify: VerifyLicenseHandler,
        drafter: Arc<dyn MessageDrafter>,
        usage: Arc<dyn UsageCounter>,
    ) -> Self {
        Self {
            verify,
            drafter,
            usage,
        }
    }

    /// # Errors
    ///
    /// - `ValidationFailed` for a prompt outside 10..=500 characters or an unknown tone
    /// - License errors from verification
    /// - `UpgradeRequired` for tiers without AI
    /// - `UsageLimitReached` when the daily or monthly allowance is spent
    /// - `Unavailable` when no model is configured
    /// - `Upstream` when the model call fails
    pub async fn handle(
        &self,
        cmd: GenerateMessageDraftCommand,
    ) -> Result<GenerateMessageDraftResult, SubscriptionError> {
        // 1. Validate request
        let prompt = DraftPrompt::new(cmd.prompt)?;
        let tone = match cmd.tone.as_deref() {
            None => Tone::default(),
            Some(raw) => Tone::parse(raw).ok_or_else(|| {
                SubscriptionError::validation(
                    "tone",
                    "tone must be one of friendly, professional, casual, formal",
                )
            })?,
        };

        // 2. License
        let license = self
            .verify
            .handle(VerifyLicenseCommand {
                license_key: cmd.license_key,
            })
            .await?;
        let clinic_id = license.clinic.id;
        let features = license.features;

        // 3. Tier gate
        if !features.ai_enabled {
            return Err(SubscriptionError::UpgradeRequired(license.subscription.tier));
        }

        // 4. Allowance
        let used_today = license.usage.today.ai_generations;
        if features.ai_daily_reached(used_today) {
            return Err(SubscriptionError::UsageLimitReached {
                used: used_today,
                limit: features.ai_daily_limit,
            });
        }
        let used_this_month = license.usage.month_to_date.ai_generations;
        if features.ai_monthly_reached(used_this_month) {
            return Err(SubscriptionError::UsageLimitReached {
                used: used_this_month,
                limit: features.ai_monthly_limit,
            });
        }

        // 5. Draft
        if !self.drafter.is_available() {
            return Err(SubscriptionError::unavailable("AI service"));
        }
        let request = DraftRequest::new(prompt, tone);
        let generated_text = self.drafter.draft(&request).await.map_err(|err| {
            tracing::error!(clinic_id = %clinic_id, error = %err, "message draft failed");
            match err {
                DraftError::NotConfigured => SubscriptionError::unavailable("AI service"),
                other => SubscriptionError::upstream(other.to_string()),
            }
        })?;

        // 6. Consume the slot. Concurrent drafts can all pass step 4, so the
        // post-increment total decides; a draft past the limit is withheld.
        let totals = self
            .usage
            .increment(
                &clinic_id,
                license.usage.date,
                UsageIncrement::new(UsageKind::AiGenerations, 1)?,
            )
            .await?;
        let usage_today = totals.ai_generations;
        if usage_today > features.ai_daily_limit {
            tracing::warn!(
                clinic_id = %clinic_id,
                usage_today,
                limit = features.ai_daily_limit,
                "concurrent drafts passed the daily allowance, draft withheld"
            );
            return Err(SubscriptionError::UsageLimitReached {
                used: features.ai_daily_limit,
                limit: features.ai_daily_limit,
            });
        }

        tracing::info!(
            clinic_id = %clinic_id,
            campaign_id = %cmd.campaign_id,
            tone = %tone,
            "message drafted"
        );
        Ok(GenerateMessageDraftResult {
            generated_text,
            usage_today,
            daily_limit: features.ai_daily_limit,
            remaining_today: features.ai_daily_limit.saturating_sub(usage_today),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryClinicRepository, InMemorySubscriptionLedger, InMemorySubscriptionRepository,
        InMemoryUsageCounter, StaticMessageDrafter,
    };
    use crate::application::handlers::subscription::DueChangeApplier;
    use crate::domain::clinic::{Clinic, LicenseKey, NewClinic};
    use crate::domain::foundation::{ClinicId, Money, SubscriptionId, Timestamp};
    use crate::domain::subscription::{
        BillingCycle, EntitlementTable, PaymentActivation, PlanCode, Subscription, Tier,
    };
    use crate::ports::{ClinicRepository, SubscriptionRepository};

    struct Fixture {
        clinics: Arc<InMemoryClinicRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        usage: Arc<InMemoryUsageCounter>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                clinics: Arc::new(InMemoryClinicRepository::new()),
                subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
                usage: Arc::new(InMemoryUsageCounter::new()),
            }
        }

        fn handler(&self, drafter: Arc<StaticMessageDrafter>) -> GenerateMessageDraftHandler {
            let applier = DueChangeApplier::new(
                self.clinics.clone(),
                self.subscriptions.clone(),
                Arc::new(InMemorySubscriptionLedger::new()),
            );
            let verify = VerifyLicenseHandler::new(
                self.clinics.clone(),
                self.subscriptions.clone(),
                self.usage.clone(),
                EntitlementTable::default(),
                applier,
            );
            GenerateMessageDraftHandler::new(verify, drafter, self.usage.clone())
        }

        async fn clinic_on(&self, tier: Tier) -> Clinic {
            let clinic = Clinic::register(
                ClinicId::new(),
                &NewClinic::from_email(format!("{}@clinica.com.br", tier.as_str().to_lowercase())),
                LicenseKey::generate(),
                Timestamp::now(),
            )
            .unwrap();
            self.clinics.insert(&clinic).await.unwrap();
            let subscription = match tier {
                Tier::Free => {
                    Subscription::create_trial(SubscriptionId::new(), clinic.id, 14, Timestamp::now())
                }
                paid => Subscription::from_payment(
                    SubscriptionId::new(),
                    clinic.id,
                    &PaymentActivation {
                        plan: PlanCode::new(paid, BillingCycle::Monthly).unwrap(),
                        payment_reference: "pay".to_string(),
                        paid_amount: Money::from_reais(197.0),
                    },
                    Timestamp::now(),
                ),
            };
            self.subscriptions.insert(&subscription).await.unwrap();
            clinic
        }

        async fn use_ai(&self, clinic: &Clinic, amount: u32) {
            self.usage
                .increment(
                    &clinic.id,
                    Timestamp::now().date(),
                    UsageIncrement::new(UsageKind::AiGenerations, amount).unwrap(),
                )
                .await
                .unwrap();
        }
    }

    fn command(clinic: &Clinic) -> GenerateMessageDraftCommand {
        GenerateMessageDraftCommand {
            campaign_id: "camp-1".to_string(),
            license_key: clinic.license_key.to_string(),
            prompt: "Lembrar pacientes da limpeza semestral".to_string(),
            tone: Some("professional".to_string()),
        }
    }

    #[tokio::test]
    async fn pro_clinic_gets_draft_and_consumes_one_slot() {
        let f = Fixture::new();
        let clinic = f.clinic_on(Tier::Pro).await;
        let drafter = Arc::new(StaticMessageDrafter::replying("  Olá {nome}! 🦷  "));

        let result = f.handler(drafter.clone()).handle(command(&clinic)).await.unwrap();

        assert_eq!(
            result,
            GenerateMessageDraftResult {
                generated_text: "Olá {nome}! 🦷".to_string(),
                usage_today: 1,
                daily_limit: 5,
                remaining_today: 4,
            }
        );
        assert_eq!(drafter.requests()[0].tone, Tone::Professional);
        let today = f.usage.daily(&clinic.id, Timestamp::now().date()).await.unwrap();
        assert_eq!(today.ai_generations, 1);
    }

    #[tokio::test]
    async fn free_clinic_needs_upgrade() {
        let f = Fixture::new();
        let clinic = f.clinic_on(Tier::Free).await;
        let drafter = Arc::new(StaticMessageDrafter::replying("texto"));

        let err = f.handler(drafter.clone()).handle(command(&clinic)).await.unwrap_err();

        assert_eq!(err, SubscriptionError::UpgradeRequired(Tier::Free));
        assert!(drafter.requests().is_empty());
    }

    #[tokio::test]
    async fn daily_limit_blocks_before_calling_model() {
        let f = Fixture::new();
        let clinic = f.clinic_on(Tier::Pro).await;
        f.use_ai(&clinic, 5).await;
        let drafter = Arc::new(StaticMessageDrafter::replying("texto"));

        let err = f.handler(drafter.clone()).handle(command(&clinic)).await.unwrap_err();

        assert_eq!(err, SubscriptionError::UsageLimitReached { used: 5, limit: 5 });
        assert!(drafter.requests().is_empty());
    }

    /// Spends `burst` AI slots for the clinic while the model is "thinking",
    /// like drafts running in parallel would.
    struct RacingDrafter {
        usage: Arc<InMemoryUsageCounter>,
        clinic_id: ClinicId,
        burst: u32,
    }

    #[async_trait::async_trait]
    impl MessageDrafter for RacingDrafter {
        fn is_available(&self) -> bool {
            true
        }

        async fn draft(&self, _request: &DraftRequest) -> Result<String, DraftError> {
            self.usage
                .increment(
                    &self.clinic_id,
                    Timestamp::now().date(),
                    UsageIncrement::new(UsageKind::AiGenerations, self.burst).unwrap(),
                )
                .await
                .unwrap();
            Ok("texto".to_string())
        }
    }

    #[tokio::test]
    async fn parallel_drafts_cannot_exceed_daily_allowance() {
        let f = Fixture::new();
        let clinic = f.clinic_on(Tier::Pro).await;
        f.use_ai(&clinic, 3).await;
        let drafter = RacingDrafter {
            usage: f.usage.clone(),
            clinic_id: clinic.id,
            burst: 2,
        };
        let verify = f.handler(Arc::new(StaticMessageDrafter::replying("x"))).verify;
        let handler = GenerateMessageDraftHandler::new(verify, Arc::new(drafter), f.usage.clone());

        let err = handler.handle(command(&clinic)).await.unwrap_err();

        assert_eq!(err, SubscriptionError::UsageLimitReached { used: 5, limit: 5 });
    }

    #[tokio::test]
    async fn last_slot_is_still_granted() {
        let f = Fixture::new();
        let clinic = f.clinic_on(Tier::Pro).await;
        f.use_ai(&clinic, 4).await;

        let result = f
            .handler(Arc::new(StaticMessageDrafter::replying("texto")))
            .handle(command(&clinic))
            .await
            .unwrap();

        assert_eq!(result.usage_today, 5);
        assert_eq!(result.remaining_today, 0);
    }

    #[tokio::test]
    async fn unavailable_model_does_not_consume_slot() {
        let f = Fixture::new();
        let clinic = f.clinic_on(Tier::Premium).await;

        let err = f
            .handler(Arc::new(StaticMessageDrafter::unavailable()))
            .handle(command(&clinic))
            .await
            .unwrap_err();

        assert_eq!(err, SubscriptionError::unavailable("AI service"));
        let today = f.usage.daily(&clinic.id, Timestamp::now().date()).await.unwrap();
        assert_eq!(today.ai_generations, 0);
    }

    #[tokio::test]
    async fn empty_model_reply_is_upstream_error() {
        let f = Fixture::new();
        let clinic = f.clinic_on(Tier::Pro).await;

        let err = f
            .handler(Arc::new(StaticMessageDrafter::replying("   ")))
            .handle(command(&clinic))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::Upstream(_)));
    }

    #[tokio::test]
    async fn short_prompt_and_unknown_tone_are_rejected() {
        let f = Fixture::new();
        let clinic = f.clinic_on(Tier::Pro).await;
        let handler = f.handler(Arc::new(StaticMessageDrafter::replying("texto")));

        let mut short = command(&clinic);
        short.prompt = "oi".to_string();
        assert!(matches!(
            handler.handle(short).await.unwrap_err(),
            SubscriptionError::ValidationFailed { .. }
        ));

        let mut loud = command(&clinic);
        loud.tone = Some("shouty".to_string());
        assert!(matches!(
            handler.handle(loud).await.unwrap_err(),
            SubscriptionError::ValidationFailed { ref field, .. } if field == "tone"
        ));
    }
}
