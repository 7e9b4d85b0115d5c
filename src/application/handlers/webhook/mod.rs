//! Payment provider notification handlers.
//!
//! ## Commands
//!
//! - `HandlePaymentNotificationHandler` - Activates the plan paid for in an approved payment

mod handle_payment_notification;

// Commands
pub use handle_payment_notification::{
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler,
    HandlePaymentNotificationResult, NotificationRejection,
};
