//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, time, money, errors)
//! - `clinic` - Clinic accounts and license keys
//! - `subscription` - Tiers, plans, entitlements and the subscription lifecycle
//! - `usage` - Daily usage counters
//! - `funnel` - Lead wizard, tracked events and dashboard rollups
//! - `campaign` - AI message drafting inputs
//! - `admin` - Dashboard administrators

pub mod admin;
pub mod campaign;
pub mod clinic;
pub mod foundation;
pub mod funnel;
pub mod subscription;
pub mod usage;
