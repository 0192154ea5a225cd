pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod notify;

pub use auth::{AdminGuard, ADMIN_KEY_HEADER};
pub use domain::quote::{QuoteEntry, QuoteFields, QuoteId, QuoteRecord, QuoteSubmission};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use notify::{DisabledNotificationSink, NotificationOutcome, NotificationSink};
