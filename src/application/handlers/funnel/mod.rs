//! Landing-site funnel handlers.
//!
//! ## Commands
//!
//! - `TrackEventHandler` - Lead wizard progress and funnel event logging
//! - `ForwardConversionHandler` - Server-side relay to the ad conversions API

mod forward_conversion;
mod track_event;

// Commands
pub use forward_conversion::{
    ConversionCustomData, ForwardConversionCommand, ForwardConversionHandler,
};
pub use track_event::{TrackEventCommand, TrackEventHandler};
