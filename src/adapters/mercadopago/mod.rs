//! Mercado Pago integration.
//!
//! - `MercadoPagoGateway` implements `PaymentGateway` over the REST API
//! - `WebhookVerifier` checks the optional `x-signature` HMAC on webhooks
//!
//! The access token and webhook secret are held as `secrecy::SecretString`.

mod client;
mod signature;

pub use client::{MercadoPagoConfig, MercadoPagoGateway};
pub use signature::{SignatureError, SignatureHeader, WebhookVerifier};
