//! HTTP handler for Mercado Pago payment notifications.
//!
//! Every outcome answers 200. A non-2xx makes the provider retry, which only
//! helps for failures that a retry can fix, and those are logged instead.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::adapters::http::state::AppState;
use crate::application::handlers::webhook::{
    HandlePaymentNotificationCommand, HandlePaymentNotificationResult,
};

use super::dto::{PaymentNotification, WebhookAck};

/// POST /api/webhooks/mercadopago - Activate subscriptions from approved payments
pub async fn mercadopago_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<WebhookAck> {
    let notification: PaymentNotification = match serde_json::from_slice(&body) {
        Ok(notification) => notification,
        Err(err) => {
            tracing::warn!(error = %err, "unparseable payment notification");
            return Json(WebhookAck::with_error("Invalid payload"));
        }
    };
    let payment_id = notification.payment_id();

    tracing::info!(
        notification_type = ?notification.notification_type,
        payment_id = ?payment_id,
        "payment notification received"
    );

    // 1. Signature, when a secret is configured
    if let Some(verifier) = state.access.webhook_verifier() {
        let signature = headers.get("x-signature").and_then(|h| h.to_str().ok());
        let request_id = headers.get("x-request-id").and_then(|h| h.to_str().ok());
        let data_id = payment_id.as_deref().unwrap_or_default();
        if let Err(err) = verifier.verify(signature, request_id, data_id) {
            tracing::warn!(error = %err, "payment notification signature rejected");
            return Json(WebhookAck::with_error("Invalid signature"));
        }
    }

    // 2. Process
    let handler = state.payment_notification_handler();
    let cmd = HandlePaymentNotificationCommand {
        notification_type: notification.notification_type,
        payment_id,
    };

    let ack = match handler.handle(cmd).await {
        Ok(HandlePaymentNotificationResult::Activated {
            clinic_id, tier, ..
        }) => WebhookAck::activated(clinic_id.to_string(), tier),
        Ok(HandlePaymentNotificationResult::Ignored)
        | Ok(HandlePaymentNotificationResult::NotApproved { .. }) => WebhookAck::received(),
        Ok(HandlePaymentNotificationResult::Rejected(rejection)) => {
            WebhookAck::with_error(rejection.message())
        }
        Err(err) => {
            tracing::error!(error = %err, "payment notification processing failed");
            WebhookAck::with_error(err.message())
        }
    };

    Json(ack)
}
