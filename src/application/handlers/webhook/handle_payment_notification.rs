//! HandlePaymentNotificationHandler - Command handler for payment webhooks.
//!
//! The notification only carries a payment id. The payment is fetched from
//! the provider, resolved to a plan and applied to the clinic named in its
//! external reference. Problems with the notification itself are reported
//! as a [`NotificationRejection`] so the caller can acknowledge them; only
//! storage failures surface as errors.

use std::fmt;
use std::sync::Arc;

use crate::application::handlers::subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler,
};
use crate::application::notifications::paid_license_email;
use crate::domain::foundation::{ClinicId, Money};
use crate::domain::subscription::{
    BillingCycle, PaymentActivation, PlanCode, PriceTable, SubscriptionError, Tier,
};
use crate::ports::{EmailSender, PaymentGateway, ProviderPayment};

/// Command to handle one provider notification.
#[derive(Debug, Clone)]
pub struct HandlePaymentNotificationCommand {
    /// Notification `type`; only `payment` is processed.
    pub notification_type: Option<String>,
    /// `data.id` from the notification body.
    pub payment_id: Option<String>,
}

/// Why a notification was acknowledged without changing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationRejection {
    MissingPaymentId,
    PaymentUnavailable,
    MissingClinicId,
    InvalidClinicId,
    ClinicNotFound,
    UnknownAmount,
}

impl NotificationRejection {
    pub fn message(&self) -> &'static str {
        match self {
            NotificationRejection::MissingPaymentId => "No payment ID",
            NotificationRejection::PaymentUnavailable => "Failed to fetch payment",
            NotificationRejection::MissingClinicId => "No clinic ID",
            NotificationRejection::InvalidClinicId => "Invalid clinic ID",
            NotificationRejection::ClinicNotFound => "Clinic not found",
            NotificationRejection::UnknownAmount => "Unknown amount",
        }
    }
}

impl fmt::Display for NotificationRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HandlePaymentNotificationResult {
    /// Not a payment notification.
    Ignored,
    /// Payment exists but is not approved yet.
    NotApproved { status: String },
    Activated {
        clinic_id: ClinicId,
        tier: Tier,
        billing_cycle: BillingCycle,
    },
    Rejected(NotificationRejection),
}

pub struct HandlePaymentNotificationHandler {
    gateway: Arc<dyn PaymentGateway>,
    activate: ActivateSubscriptionHandler,
    email: Arc<dyn EmailSender>,
    prices: PriceTable,
}

impl HandlePaymentNotificationHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        activate: ActivateSubscriptionHandler,
        email: Arc<dyn EmailSender>,
        prices: PriceTable,
    ) -> Self {
        Self {
            gateway,
            activate,
            email,
            prices,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentNotificationCommand,
    ) -> Result<HandlePaymentNotificationResult, SubscriptionError> {
        use HandlePaymentNotificationResult::Rejected;

        // 1. Only payment notifications
        if cmd.notification_type.as_deref() != Some("payment") {
            tracing::debug!(notification_type = ?cmd.notification_type, "ignoring notification");
            return Ok(HandlePaymentNotificationResult::Ignored);
        }
        let Some(payment_id) = cmd.payment_id.filter(|id| !id.trim().is_empty()) else {
            tracing::warn!("payment notification without payment id");
            return Ok(Rejected(NotificationRejection::MissingPaymentId));
        };

        // 2. Fetch payment
        let payment = match self.gateway.fetch_payment(&payment_id).await {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                tracing::warn!(payment_id = %payment_id, "payment not found at provider");
                return Ok(Rejected(NotificationRejection::PaymentUnavailable));
            }
            Err(err) => {
                tracing::error!(payment_id = %payment_id, error = %err, "failed to fetch payment");
                return Ok(Rejected(NotificationRejection::PaymentUnavailable));
            }
        };

        // 3. Approved only
        if !payment.is_approved() {
            tracing::info!(payment_id = %payment_id, status = %payment.status, "payment not approved");
            return Ok(HandlePaymentNotificationResult::NotApproved {
                status: payment.status,
            });
        }

        // 4. Clinic reference
        let Some(reference) = payment.external_reference.as_deref() else {
            tracing::error!(payment_id = %payment_id, "approved payment without external reference");
            return Ok(Rejected(NotificationRejection::MissingClinicId));
        };
        let Ok(clinic_id) = reference.trim().parse::<ClinicId>() else {
            tracing::error!(payment_id = %payment_id, reference = %reference, "external reference is not a clinic id");
            return Ok(Rejected(NotificationRejection::InvalidClinicId));
        };

        // 5. Plan
        let Some(activation) = self.resolve_plan(&payment) else {
            tracing::error!(
                payment_id = %payment_id,
                clinic_id = %clinic_id,
                amount = ?payment.transaction_amount,
                "unknown payment amount, nothing activated"
            );
            return Ok(Rejected(NotificationRejection::UnknownAmount));
        };
        let plan = activation.plan;

        // 6. Activate
        let activated = match self
            .activate
            .handle(ActivateSubscriptionCommand {
                clinic_id,
                activation,
            })
            .await
        {
            Ok(activated) => activated,
            Err(SubscriptionError::ClinicNotFound) => {
                tracing::error!(payment_id = %payment_id, clinic_id = %clinic_id, "payment for unknown clinic");
                return Ok(Rejected(NotificationRejection::ClinicNotFound));
            }
            Err(err) => return Err(err),
        };

        // 7. Confirmation email, best effort
        let message = paid_license_email(&activated.clinic, &activated.subscription, &payment_id);
        if let Err(err) = self.email.send(&message).await {
            tracing::warn!(clinic_id = %clinic_id, error = %err, "payment confirmation email failed");
        }

        Ok(HandlePaymentNotificationResult::Activated {
            clinic_id,
            tier: plan.tier(),
            billing_cycle: plan.cycle(),
        })
    }

    /// An explicit plan reference wins when the amount paid matches it;
    /// otherwise the exact amount is looked up in the price table.
    fn resolve_plan(&self, payment: &ProviderPayment) -> Option<PaymentActivation> {
        let amount = payment.transaction_amount.map(Money::from_reais)?;

        let referenced = payment.plan_reference.as_deref().and_then(|raw| {
            raw.parse::<PlanCode>()
                .map_err(|err| {
                    tracing::warn!(plan_reference = %raw, error = %err, "ignoring unparseable plan reference");
                })
                .ok()
        });

        let plan = match referenced {
            Some(plan) if self.prices.accepts(plan, amount) => plan,
            Some(plan) => {
                tracing::warn!(plan = %plan, amount = %amount, "amount paid does not match referenced plan");
                return None;
            }
            None => self.prices.plan_for_amount(amount)?,
        };

        Some(PaymentActivation {
            plan,
            payment_reference: payment.id.clone(),
            paid_amount: amount,
        })
    }
}
