//! HTTP adapters - REST API implementations.
//!
//! Each area has its own dto / handlers / routes modules; `router` stitches
//! them together under `/api` behind the shared middleware stack.

pub mod admin;
pub mod campaigns;
pub mod error;
pub mod extract;
pub mod funnel;
pub mod license;
pub mod middleware;
pub mod router;
pub mod signup;
pub mod state;
pub mod webhooks;

// Re-export key types for convenience
pub use error::{ApiError, ErrorResponse, VerificationError};
pub use extract::{ApiJson, VerifyJson};
pub use router::{api_routes, build_router};
pub use state::{AccessSettings, AppState, BillingSettings, Integrations, Storage};
