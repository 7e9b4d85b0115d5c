//! Axum router configuration for webhooks.
//!
//! Webhooks carry no user authentication; Mercado Pago notifications are
//! checked against the `x-signature` header when a secret is configured.

use axum::{routing::post, Router};

use crate::adapters::http::state::AppState;

use super::handlers::mercadopago_webhook;

/// # Routes
/// - `POST /webhooks/mercadopago` - Payment notifications
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/mercadopago", post(mercadopago_webhook))
}
