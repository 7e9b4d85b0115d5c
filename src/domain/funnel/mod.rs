//! Landing-page funnel: lead wizard, tracked events and dashboard rollups.

mod analytics;
mod errors;
mod events;
mod lead;

pub use analytics::{
    download_bucket, AnalyticsOverview, ConversionRates, FunnelCounts, LeadSummary, Overview,
    ReportingPeriod,
};
pub use errors::FunnelError;
pub use events::{
    ConversionDetails, ConversionRecord, DownloadDetails, DownloadRecord, FunnelEvent,
    PageViewRecord, PaymentDetails, PaymentEventRecord, PaymentEventStatus, RequestMeta,
    PAYMENT_PROVIDER,
};
pub use lead::{CalculatorInputs, ContactDetails, Lead, LeadStatus};
