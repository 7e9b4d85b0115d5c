//! Campaign message drafting.

mod draft;

pub use draft::{DraftPrompt, DraftRequest, Tone};
