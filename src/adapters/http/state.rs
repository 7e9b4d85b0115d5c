//! Shared application state.
//!
//! One `AppState` is cloned into every request. It holds the port
//! implementations chosen at startup plus the billing and access settings
//! derived from `AppConfig`, and builds application handlers on demand.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use subtle::ConstantTimeEq;

use crate::adapters::memory::{
    InMemoryAdminUserRepository, InMemoryClinicRepository, InMemoryFunnelStore,
    InMemorySubscriptionLedger, InMemorySubscriptionRepository, InMemoryUsageCounter,
};
use crate::adapters::mercadopago::WebhookVerifier;
use crate::adapters::postgres::{
    PostgresAdminUserRepository, PostgresClinicRepository, PostgresFunnelStore,
    PostgresSubscriptionLedger, PostgresSubscriptionRepository, PostgresUsageCounter,
};
use crate::application::handlers::admin::{
    AdminLoginHandler, DeleteLeadHandler, GetDashboardHandler,
};
use crate::application::handlers::campaigns::GenerateMessageDraftHandler;
use crate::application::handlers::funnel::{ForwardConversionHandler, TrackEventHandler};
use crate::application::handlers::license::{
    GetClinicByEmailHandler, ResendLicenseHandler, VerifyLicenseHandler,
};
use crate::application::handlers::signup::{ProvisionTrialAccountHandler, RegisterClinicHandler};
use crate::application::handlers::subscription::{
    ActivateSubscriptionHandler, ApplyDueChangesHandler, CreatePendingHandler,
    CreateTrialHandler, DueChangeApplier, ManageSubscriptionHandler, ScheduleChangeHandler,
};
use crate::application::handlers::usage::RecordUsageHandler;
use crate::application::handlers::webhook::HandlePaymentNotificationHandler;
use crate::config::{AppConfig, ConfigReport, ValidationError};
use crate::domain::subscription::{CheckoutLinks, EntitlementTable, PriceTable};
use crate::ports::{
    AdminSessions, AdminUserRepository, AnalyticsReader, ClinicRepository, ConversionsApi,
    EmailSender, FunnelEventStore, LeadRepository, MessageDrafter, PaymentGateway, RateLimiter,
    SubscriptionLedger, SubscriptionRepository, UsageCounter,
};

// ════════════════════════════════════════════════════════════════════════════════
// Storage
// ════════════════════════════════════════════════════════════════════════════════

/// Every storage port, backed by one store.
#[derive(Clone)]
pub struct Storage {
    pub clinics: Arc<dyn ClinicRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub ledger: Arc<dyn SubscriptionLedger>,
    pub usage: Arc<dyn UsageCounter>,
    pub leads: Arc<dyn LeadRepository>,
    pub funnel_events: Arc<dyn FunnelEventStore>,
    pub analytics: Arc<dyn AnalyticsReader>,
    pub admins: Arc<dyn AdminUserRepository>,
}

impl Storage {
    pub fn in_memory() -> Self {
        let funnel = Arc::new(InMemoryFunnelStore::new());
        Self {
            clinics: Arc::new(InMemoryClinicRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            ledger: Arc::new(InMemorySubscriptionLedger::new()),
            usage: Arc::new(InMemoryUsageCounter::new()),
            leads: funnel.clone(),
            funnel_events: funnel.clone(),
            analytics: funnel,
            admins: Arc::new(InMemoryAdminUserRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let funnel = Arc::new(PostgresFunnelStore::new(pool.clone()));
        Self {
            clinics: Arc::new(PostgresClinicRepository::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
            ledger: Arc::new(PostgresSubscriptionLedger::new(pool.clone())),
            usage: Arc::new(PostgresUsageCounter::new(pool.clone())),
            leads: funnel.clone(),
            funnel_events: funnel.clone(),
            analytics: funnel,
            admins: Arc::new(PostgresAdminUserRepository::new(pool)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Integrations
// ════════════════════════════════════════════════════════════════════════════════

/// Outbound services and request guards.
#[derive(Clone)]
pub struct Integrations {
    pub payments: Arc<dyn PaymentGateway>,
    pub email: Arc<dyn EmailSender>,
    pub drafter: Arc<dyn MessageDrafter>,
    pub conversions: Arc<dyn ConversionsApi>,
    pub admin_sessions: Arc<dyn AdminSessions>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Settings
// ════════════════════════════════════════════════════════════════════════════════

/// Prices, entitlements and checkout links handed to handlers.
#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub prices: PriceTable,
    pub entitlements: EntitlementTable,
    pub checkout_links: CheckoutLinks,
    pub trial_days: u32,
}

impl BillingSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            prices: config.billing.price_table()?,
            entitlements: config.billing.entitlements(),
            checkout_links: config.payment.checkout_links(),
            trial_days: config.billing.trial_days,
        })
    }
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            prices: PriceTable::default(),
            entitlements: EntitlementTable::default(),
            checkout_links: CheckoutLinks::default(),
            trial_days: 14,
        }
    }
}

/// Credentials checked by the middleware.
pub struct AccessSettings {
    service_token: SecretString,
    admin_dashboard_token: Option<SecretString>,
    webhook_verifier: Option<WebhookVerifier>,
    pub rate_limiting: bool,
}

impl AccessSettings {
    pub fn new(service_token: impl Into<String>) -> Self {
        Self {
            service_token: SecretString::new(service_token.into()),
            admin_dashboard_token: None,
            webhook_verifier: None,
            rate_limiting: true,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut settings = Self::new(config.auth.service_token.clone());
        if let Some(token) = config.auth.admin_dashboard_token() {
            settings = settings.with_dashboard_token(token);
        }
        if let Some(secret) = config.payment.webhook_secret() {
            settings = settings.with_webhook_secret(secret);
        }
        settings.rate_limiting = config.features.rate_limiting;
        settings
    }

    pub fn with_dashboard_token(mut self, token: impl Into<String>) -> Self {
        self.admin_dashboard_token = Some(SecretString::new(token.into()));
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_verifier = Some(WebhookVerifier::new(secret));
        self
    }

    pub fn without_rate_limiting(mut self) -> Self {
        self.rate_limiting = false;
        self
    }

    /// An empty configured token never matches.
    pub fn is_service_token(&self, candidate: &str) -> bool {
        constant_time_match(self.service_token.expose_secret(), candidate)
    }

    pub fn is_dashboard_token(&self, candidate: &str) -> bool {
        self.admin_dashboard_token
            .as_ref()
            .is_some_and(|token| constant_time_match(token.expose_secret(), candidate))
    }

    /// `None` when webhook signatures are not checked.
    pub fn webhook_verifier(&self) -> Option<&WebhookVerifier> {
        self.webhook_verifier.as_ref()
    }
}

fn constant_time_match(expected: &str, candidate: &str) -> bool {
    !expected.is_empty() && expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub integrations: Integrations,
    pub billing: Arc<BillingSettings>,
    pub access: Arc<AccessSettings>,
    pub config_report: Arc<ConfigReport>,
}

impl AppState {
    pub fn new(
        storage: Storage,
        integrations: Integrations,
        billing: BillingSettings,
        access: AccessSettings,
    ) -> Self {
        Self {
            storage,
            integrations,
            billing: Arc::new(billing),
            access: Arc::new(access),
            config_report: Arc::new(ConfigReport::default()),
        }
    }

    /// Report served by the admin diagnostic endpoint.
    pub fn with_config_report(mut self, report: ConfigReport) -> Self {
        self.config_report = Arc::new(report);
        self
    }

    // Subscription record manager

    fn create_trial(&self) -> CreateTrialHandler {
        CreateTrialHandler::new(
            self.storage.subscriptions.clone(),
            self.storage.ledger.clone(),
            self.billing.trial_days,
        )
    }

    fn create_pending(&self) -> CreatePendingHandler {
        CreatePendingHandler::new(
            self.storage.subscriptions.clone(),
            self.storage.ledger.clone(),
            self.billing.prices.clone(),
        )
    }

    fn due_change_applier(&self) -> DueChangeApplier {
        DueChangeApplier::new(
            self.storage.clinics.clone(),
            self.storage.subscriptions.clone(),
            self.storage.ledger.clone(),
        )
    }

    fn provision_trial_account(&self) -> ProvisionTrialAccountHandler {
        ProvisionTrialAccountHandler::new(self.storage.clinics.clone(), self.create_trial())
    }

    pub fn apply_due_changes_handler(&self) -> ApplyDueChangesHandler {
        ApplyDueChangesHandler::new(self.storage.subscriptions.clone(), self.due_change_applier())
    }

    // License clients

    pub fn verify_license_handler(&self) -> VerifyLicenseHandler {
        VerifyLicenseHandler::new(
            self.storage.clinics.clone(),
            self.storage.subscriptions.clone(),
            self.storage.usage.clone(),
            self.billing.entitlements,
            self.due_change_applier(),
        )
    }

    pub fn resend_license_handler(&self) -> ResendLicenseHandler {
        ResendLicenseHandler::new(
            self.provision_trial_account(),
            self.integrations.email.clone(),
        )
    }

    pub fn manage_subscription_handler(&self) -> ManageSubscriptionHandler {
        ManageSubscriptionHandler::new(
            self.storage.clinics.clone(),
            self.storage.subscriptions.clone(),
            ScheduleChangeHandler::new(
                self.storage.subscriptions.clone(),
                self.storage.ledger.clone(),
            ),
            self.billing.checkout_links.clone(),
        )
    }

    pub fn get_clinic_by_email_handler(&self) -> GetClinicByEmailHandler {
        GetClinicByEmailHandler::new(self.storage.clinics.clone())
    }

    pub fn record_usage_handler(&self) -> RecordUsageHandler {
        RecordUsageHandler::new(self.storage.clinics.clone(), self.storage.usage.clone())
    }

    pub fn generate_message_draft_handler(&self) -> GenerateMessageDraftHandler {
        GenerateMessageDraftHandler::new(
            self.verify_license_handler(),
            self.integrations.drafter.clone(),
            self.storage.usage.clone(),
        )
    }

    // Signup and payments

    pub fn register_clinic_handler(&self) -> RegisterClinicHandler {
        RegisterClinicHandler::new(
            self.storage.clinics.clone(),
            self.create_trial(),
            self.create_pending(),
            self.billing.checkout_links.clone(),
        )
    }

    pub fn payment_notification_handler(&self) -> HandlePaymentNotificationHandler {
        HandlePaymentNotificationHandler::new(
            self.integrations.payments.clone(),
            ActivateSubscriptionHandler::new(
                self.storage.clinics.clone(),
                self.storage.subscriptions.clone(),
                self.storage.ledger.clone(),
            ),
            self.integrations.email.clone(),
            self.billing.prices.clone(),
        )
    }

    // Funnel

    pub fn track_event_handler(&self) -> TrackEventHandler {
        TrackEventHandler::new(
            self.storage.leads.clone(),
            self.storage.funnel_events.clone(),
            self.storage.clinics.clone(),
            self.provision_trial_account(),
            self.integrations.email.clone(),
        )
    }

    pub fn forward_conversion_handler(&self) -> ForwardConversionHandler {
        ForwardConversionHandler::new(self.integrations.conversions.clone())
    }

    // Admin

    pub fn admin_login_handler(&self) -> AdminLoginHandler {
        AdminLoginHandler::new(
            self.storage.admins.clone(),
            self.integrations.admin_sessions.clone(),
        )
    }

    pub fn dashboard_handler(&self) -> GetDashboardHandler {
        GetDashboardHandler::new(self.storage.analytics.clone())
    }

    pub fn delete_lead_handler(&self) -> DeleteLeadHandler {
        DeleteLeadHandler::new(self.storage.leads.clone())
    }
}
