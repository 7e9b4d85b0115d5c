//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Clinics, subscriptions, usage, funnel and admin storage
//! - `memory` - In-memory storage and integration fakes for development and tests
//! - `mercadopago` - Payment lookups and webhook signature checks
//! - `resend` - Transactional email
//! - `ai` - Message drafting via OpenAI
//! - `facebook` - Conversions API relay
//! - `auth` - Admin session tokens
//! - `rate_limiter` - Fixed-window limits (in-memory, Redis)
//! - `http` - REST API

pub mod ai;
pub mod auth;
pub mod facebook;
pub mod http;
pub mod memory;
pub mod mercadopago;
pub mod postgres;
pub mod rate_limiter;
pub mod resend;

pub use ai::{OpenAIConfig, OpenAIDrafter};
pub use auth::JwtAdminSessions;
pub use facebook::{DisabledConversionsApi, GraphConversionsApi};
pub use mercadopago::{MercadoPagoConfig, MercadoPagoGateway, WebhookVerifier};
pub use rate_limiter::{InMemoryRateLimiter, RateLimitConfig, RedisRateLimiter};
pub use resend::{LoggingEmailSender, ResendEmailSender};
