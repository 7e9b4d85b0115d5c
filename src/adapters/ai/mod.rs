//! AI drafting adapters.
//!
//! - `OpenAIDrafter` - `MessageDrafter` over OpenAI chat completions

mod openai_drafter;

pub use openai_drafter::{OpenAIConfig, OpenAIDrafter};
