//! Write side for tracked funnel events.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::funnel::{ConversionRecord, DownloadRecord, PageViewRecord, PaymentEventRecord};

#[async_trait]
pub trait FunnelEventStore: Send + Sync {
    async fn record_page_view(&self, record: &PageViewRecord) -> Result<(), DomainError>;

    async fn record_download(&self, record: &DownloadRecord) -> Result<(), DomainError>;

    async fn record_payment_event(&self, record: &PaymentEventRecord) -> Result<(), DomainError>;

    async fn record_conversion(&self, record: &ConversionRecord) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funnel_event_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn FunnelEventStore) {}
    }
}
