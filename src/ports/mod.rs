//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `ClinicRepository` - Clinic accounts and license keys
//! - `SubscriptionRepository` / `SubscriptionLedger` - Subscription row and its history
//! - `UsageCounter` - Atomic per-day usage counters
//! - `LeadRepository` / `FunnelEventStore` - Funnel writes
//! - `AnalyticsReader` - Dashboard rollups
//! - `AdminUserRepository` - Dashboard accounts
//!
//! ## Integration Ports
//!
//! - `PaymentGateway` - Payment lookups for webhooks
//! - `EmailSender` - Transactional email
//! - `MessageDrafter` - LLM message drafting
//! - `ConversionsApi` - Server-side ad conversions
//! - `AdminSessions` - Admin session tokens
//! - `RateLimiter` - Per-IP request budgets

mod admin_sessions;
mod admin_user_repository;
mod analytics_reader;
mod clinic_repository;
mod conversions_api;
mod email_sender;
mod funnel_event_store;
mod lead_repository;
mod message_drafter;
mod payment_gateway;
mod rate_limiter;
mod subscription_repository;
mod usage_counter;

pub use admin_sessions::{AdminIdentity, AdminSession, AdminSessions};
pub use admin_user_repository::AdminUserRepository;
pub use analytics_reader::AnalyticsReader;
pub use clinic_repository::ClinicRepository;
pub use conversions_api::{
    hash_pii, ConversionError, ConversionEvent, ConversionsApi, CustomData, HashedUserData,
    RawUserData,
};
pub use email_sender::{EmailError, EmailMessage, EmailSender};
pub use funnel_event_store::FunnelEventStore;
pub use lead_repository::LeadRepository;
pub use message_drafter::{DraftError, MessageDrafter};
pub use payment_gateway::{PaymentError, PaymentGateway, ProviderPayment};
pub use rate_limiter::{RateLimitDecision, RateLimitError, RateLimitKey, RateLimiter};
pub use subscription_repository::{SubscriptionLedger, SubscriptionRepository};
pub use usage_counter::UsageCounter;
