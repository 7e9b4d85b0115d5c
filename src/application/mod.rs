//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers own no state beyond their `Arc<dyn Port>` dependencies and are
//! built per request from the shared HTTP state.

pub mod handlers;
pub mod notifications;
