//! Campaign handlers.
//!
//! ## Commands
//!
//! - `GenerateMessageDraftHandler` - Tier-gated, rate-limited AI message draft

mod generate_message_draft;

// Commands
pub use generate_message_draft::{
    GenerateMessageDraftCommand, GenerateMessageDraftHandler, GenerateMessageDraftResult,
};
