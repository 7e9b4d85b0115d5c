//! LK Reactor Pro backend
//!
//! License verification, subscriptions and usage limits for the desktop
//! WhatsApp campaign client, plus signup, Mercado Pago payment webhooks,
//! landing-page funnel tracking and the admin dashboard.
//!
//! Layout follows ports and adapters: `domain` holds the rules, `ports` the
//! traits the application depends on, `application` the command and query
//! handlers, and `adapters` the Postgres, HTTP and third-party implementations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
