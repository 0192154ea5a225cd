//! Contract for best-effort notification about newly created quotes.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::quote::QuoteRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Delivered,
    Skipped { reason: String },
    Failed { reason: String },
}

impl NotificationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// A sink never returns an error: failures are reported in the outcome so the
/// caller can log them without affecting the submission.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, record: &QuoteRecord) -> NotificationOutcome;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Used when notification settings are incomplete.
#[derive(Clone, Debug, Default)]
pub struct DisabledNotificationSink {
    missing: Vec<&'static str>,
}

impl DisabledNotificationSink {
    pub fn new(missing: Vec<&'static str>) -> Self {
        Self { missing }
    }
}

#[async_trait]
impl NotificationSink for DisabledNotificationSink {
    async fn notify(&self, _record: &QuoteRecord) -> NotificationOutcome {
        let reason = if self.missing.is_empty() {
            "notifications are not configured".to_string()
        } else {
            format!("missing {}", self.missing.join(", "))
        };
        NotificationOutcome::Skipped { reason }
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
