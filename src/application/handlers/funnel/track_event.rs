//! TrackEventHandler - Records one event posted by the landing site.
//!
//! Lead steps upsert the session's lead; a step that arrives before its
//! predecessors starts the lead on the spot. Completing the wizard also
//! provisions a FREE trial account for the contact email. Account and
//! email side effects never fail the tracking call.

use std::sync::Arc;

use serde_json::Value;

use crate::application::handlers::signup::{
    ProvisionTrialAccountCommand, ProvisionTrialAccountHandler,
};
use crate::application::notifications::free_license_email;
use crate::domain::clinic::{NewClinic, PLACEHOLDER_NAME};
use crate::domain::foundation::{normalize_email, LeadId, Timestamp};
use crate::domain::funnel::{
    ContactDetails, ConversionRecord, DownloadRecord, FunnelError, FunnelEvent, Lead,
    PageViewRecord, PaymentDetails, PaymentEventRecord, PaymentEventStatus, RequestMeta,
};
use crate::domain::subscription::Tier;
use crate::ports::{ClinicRepository, EmailSender, FunnelEventStore, LeadRepository};

#[derive(Debug, Clone, Default)]
pub struct TrackEventCommand {
    pub event_type: Option<String>,
    pub session_id: Option<String>,
    pub data: Option<Value>,
    pub meta: RequestMeta,
}

pub struct TrackEventHandler {
    leads: Arc<dyn LeadRepository>,
    events: Arc<dyn FunnelEventStore>,
    clinics: Arc<dyn ClinicRepository>,
    provision: ProvisionTrialAccountHandler,
    email: Arc<dyn EmailSender>,
}

impl TrackEventHandler {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        events: Arc<dyn FunnelEventStore>,
        clinics: Arc<dyn ClinicRepository>,
        provision: ProvisionTrialAccountHandler,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            leads,
            events,
            clinics,
            provision,
            email,
        }
    }

    pub async fn handle(&self, cmd: TrackEventCommand) -> Result<(), FunnelError> {
        let (Some(event_type), Some(session_id)) = (
            cmd.event_type.filter(|t| !t.trim().is_empty()),
            cmd.session_id.filter(|s| !s.trim().is_empty()),
        ) else {
            return Err(FunnelError::validation(
                "eventType",
                "eventType and sessionId are required",
            ));
        };
        let event = FunnelEvent::parse(event_type.trim(), cmd.data.as_ref())?;
        let now = Timestamp::now();

        tracing::debug!(session_id = %session_id, event_type = event.event_type(), "tracking event");

        match event {
            FunnelEvent::PageView { page } => {
                self.events
                    .record_page_view(&PageViewRecord {
                        session_id,
                        page,
                        meta: cmd.meta,
                        occurred_at: now,
                    })
                    .await?;
            }
            FunnelEvent::LeadStarted => {
                if self.leads.find_by_session(&session_id).await?.is_none() {
                    self.leads
                        .save(&Lead::start(LeadId::new(), session_id, now))
                        .await?;
                }
            }
            FunnelEvent::LeadStep1(inputs) => {
                let mut lead = self.lead_for(&session_id, now).await?;
                lead.record_calculator(inputs, now);
                self.leads.save(&lead).await?;
            }
            FunnelEvent::LeadStep2(contact) => {
                let mut lead = self.lead_for(&session_id, now).await?;
                lead.record_contact(contact, now);
                self.leads.save(&lead).await?;
            }
            FunnelEvent::LeadCompleted {
                calculator,
                contact,
            } => {
                let mut lead = self.lead_for(&session_id, now).await?;
                lead.complete(contact.clone(), calculator, now);
                self.leads.save(&lead).await?;
                self.provision_for_lead(&contact).await;
            }
            FunnelEvent::TrialActivated { email } => {
                if let Some(email) = email {
                    self.send_trial_email(&email).await;
                }
                self.events
                    .record_conversion(&ConversionRecord::free_registration(&session_id, now))
                    .await?;
            }
            FunnelEvent::Download(details) => {
                self.events
                    .record_download(&DownloadRecord {
                        session_id,
                        details,
                        occurred_at: now,
                    })
                    .await?;
            }
            FunnelEvent::PaymentInitiated(details) => {
                self.record_payment(session_id, details, PaymentEventStatus::Initiated, now)
                    .await?;
            }
            FunnelEvent::PaymentCompleted(details) => {
                self.record_payment(session_id, details, PaymentEventStatus::Completed, now)
                    .await?;
            }
            FunnelEvent::Conversion(details) => {
                self.events
                    .record_conversion(&ConversionRecord {
                        session_id,
                        details,
                        occurred_at: now,
                    })
                    .await?;
            }
        }
        Ok(())
    }

    async fn lead_for(&self, session_id: &str, now: Timestamp) -> Result<Lead, FunnelError> {
        Ok(self
            .leads
            .find_by_session(session_id)
            .await?
            .unwrap_or_else(|| Lead::start(LeadId::new(), session_id, now)))
    }

    async fn record_payment(
        &self,
        session_id: String,
        details: PaymentDetails,
        status: PaymentEventStatus,
        now: Timestamp,
    ) -> Result<(), FunnelError> {
        let conversion = ConversionRecord::for_payment(&session_id, &details, status, now);
        self.events
            .record_payment_event(&PaymentEventRecord {
                session_id,
                details,
                status,
                occurred_at: now,
            })
            .await?;
        self.events.record_conversion(&conversion).await?;
        Ok(())
    }

    async fn provision_for_lead(&self, contact: &ContactDetails) {
        let Some(email) = contact.email.clone() else {
            return;
        };
        let registration = NewClinic {
            name: contact
                .name
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_NAME.to_string()),
            clinic_name: contact.clinic_name.clone(),
            email,
            phone: contact.whatsapp.clone(),
            tier: Tier::Free,
        };
        match self
            .provision
            .handle(ProvisionTrialAccountCommand { registration })
            .await
        {
            Ok(account) if account.created => {
                tracing::info!(clinic_id = %account.clinic.id, "trial account created from lead");
            }
            Ok(account) => {
                tracing::debug!(clinic_id = %account.clinic.id, "lead email already has an account");
            }
            Err(err) => tracing::warn!(error = %err, "trial provisioning from lead failed"),
        }
    }

    async fn send_trial_email(&self, email: &str) {
        let Ok(email) = normalize_email(email) else {
            return;
        };
        let clinic = match self.clinics.find_by_email(&email).await {
            Ok(Some(clinic)) => clinic,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, "clinic lookup for trial email failed");
                return;
            }
        };
        if let Err(err) = self.email.send(&free_license_email(&clinic)).await {
            tracing::warn!(clinic_id = %clinic.id, error = %err, "trial email failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryClinicRepository, InMemoryFunnelStore, InMemorySubscriptionLedger,
        InMemorySubscriptionRepository, RecordingEmailSender,
    };
    use crate::application::handlers::subscription::CreateTrialHandler;
    use crate::domain::funnel::LeadStatus;
    use serde_json::json;

    struct Fixture {
        store: Arc<InMemoryFunnelStore>,
        clinics: Arc<InMemoryClinicRepository>,
        email: Arc<RecordingEmailSender>,
        handler: TrackEventHandler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryFunnelStore::new());
        let clinics = Arc::new(InMemoryClinicRepository::new());
        let email = Arc::new(RecordingEmailSender::new());
        let provision = ProvisionTrialAccountHandler::new(
            clinics.clone(),
            CreateTrialHandler::new(
                Arc::new(InMemorySubscriptionRepository::new()),
                Arc::new(InMemorySubscriptionLedger::new()),
                14,
            ),
        );
        let handler = TrackEventHandler::new(
            store.clone(),
            store.clone(),
            clinics.clone(),
            provision,
            email.clone(),
        );
        Fixture {
            store,
            clinics,
            email,
            handler,
        }
    }

    fn event(event_type: &str, data: Value) -> TrackEventCommand {
        TrackEventCommand {
            event_type: Some(event_type.to_string()),
            session_id: Some("sess-1".to_string()),
            data: Some(data),
            meta: RequestMeta::default(),
        }
    }

    fn contact_data() -> Value {
        json!({
            "name": "Dra. Ana",
            "clinicName": "Sorriso",
            "email": "Ana@Sorriso.com.br",
            "whatsapp": "11999990000",
            "totalPatients": 1200,
            "ticketMedio": "350"
        })
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Lead wizard
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn lead_started_is_idempotent() {
        let f = fixture();

        f.handler.handle(event("lead_started", json!({}))).await.unwrap();
        let first = f.store.find_by_session("sess-1").await.unwrap().unwrap();
        f.handler.handle(event("lead_started", json!({}))).await.unwrap();
        let second = f.store.find_by_session("sess-1").await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, LeadStatus::Started);
    }

    #[tokio::test]
    async fn step_without_started_lead_creates_one() {
        let f = fixture();

        f.handler
            .handle(event("lead_step2", contact_data()))
            .await
            .unwrap();

        let lead = f.store.find_by_session("sess-1").await.unwrap().unwrap();
        assert_eq!(lead.status, LeadStatus::Step2);
        assert_eq!(lead.contact.email.as_deref(), Some("ana@sorriso.com.br"));
    }

    #[tokio::test]
    async fn completion_provisions_trial_account_once() {
        let f = fixture();
        f.handler.handle(event("lead_step1", contact_data())).await.unwrap();

        f.handler
            .handle(event("lead_completed", contact_data()))
            .await
            .unwrap();
        f.handler
            .handle(event("lead_completed", contact_data()))
            .await
            .unwrap();

        let lead = f.store.find_by_session("sess-1").await.unwrap().unwrap();
        assert_eq!(lead.status, LeadStatus::Completed);
        assert_eq!(lead.calculator.total_patients, Some(1200));
        assert_eq!(f.clinics.len(), 1);
        let clinic = f.clinics.find_by_email("ana@sorriso.com.br").await.unwrap().unwrap();
        assert_eq!(clinic.name, "Dra. Ana");
        assert_eq!(clinic.phone.as_deref(), Some("11999990000"));
        // email waits for trial_activated
        assert!(f.email.sent().is_empty());
    }

    #[tokio::test]
    async fn trial_activation_emails_key_and_logs_registration() {
        let f = fixture();
        f.handler
            .handle(event("lead_completed", contact_data()))
            .await
            .unwrap();

        f.handler
            .handle(event("trial_activated", json!({ "email": "ana@sorriso.com.br" })))
            .await
            .unwrap();

        assert_eq!(f.email.sent().len(), 1);
        let conversions = f.store.conversions();
        assert_eq!(conversions.len(), 1);
        assert_eq!(conversions[0].details.event_name, "CompleteRegistration");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Event log
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn page_view_keeps_request_meta() {
        let f = fixture();
        let mut cmd = event("page_view", json!({ "page": "/precos" }));
        cmd.meta.referrer = Some("https://google.com".to_string());

        f.handler.handle(cmd).await.unwrap();

        let views = f.store.page_views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].page.as_deref(), Some("/precos"));
        assert_eq!(views[0].meta.referrer.as_deref(), Some("https://google.com"));
    }

    #[tokio::test]
    async fn payment_completed_logs_payment_and_purchase() {
        let f = fixture();

        f.handler
            .handle(event(
                "payment_completed",
                json!({ "email": "a@b.com", "planType": "pro", "amount": 197, "paymentId": 123 }),
            ))
            .await
            .unwrap();

        let payments = f.store.payment_events();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentEventStatus::Completed);
        assert_eq!(payments[0].details.payment_id.as_deref(), Some("123"));
        let conversions = f.store.conversions();
        assert_eq!(conversions[0].details.event_name, "Purchase");
        assert_eq!(conversions[0].details.value, 197.0);
    }

    #[tokio::test]
    async fn download_defaults_plan_type() {
        let f = fixture();

        f.handler
            .handle(event("download", json!({ "email": "a@b.com" })))
            .await
            .unwrap();

        assert_eq!(f.store.downloads()[0].details.plan_type, "free");
    }

    #[tokio::test]
    async fn missing_session_or_unknown_type_is_rejected() {
        let f = fixture();

        let mut no_session = event("page_view", json!({}));
        no_session.session_id = None;
        let err = f.handler.handle(no_session).await.unwrap_err();
        assert_eq!(err.message(), "eventType and sessionId are required");

        let err = f.handler.handle(event("clicked", json!({}))).await.unwrap_err();
        assert_eq!(err.message(), "Invalid eventType");
    }
}
