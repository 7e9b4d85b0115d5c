//! Application handlers.
//!
//! Command and query handlers grouped by the area they serve:
//!
//! - `subscription` - Record manager: trial, pending, activation, scheduled changes
//! - `license` - Verification, key resend and lookup by email
//! - `signup` - Direct signup and find-or-create trial accounts
//! - `usage` - Counter increments from the desktop client
//! - `webhook` - Payment provider notifications
//! - `campaigns` - AI message drafting
//! - `funnel` - Tracked visitor events and the conversions relay
//! - `admin` - Dashboard login, rollups and lead deletion

pub mod admin;
pub mod campaigns;
pub mod funnel;
pub mod license;
pub mod signup;
pub mod subscription;
pub mod usage;
pub mod webhook;
