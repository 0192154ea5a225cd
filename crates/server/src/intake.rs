use std::sync::Arc;

use chrono::Utc;
use quotedesk_core::{ApplicationError, QuoteEntry, QuoteId, QuoteRecord, QuoteSubmission};
use quotedesk_db::{QuoteRepository, RepositoryError};
use tokio::sync::Mutex;
use tracing::info;

use crate::notifier::NotificationDispatcher;

/// Validates submissions, persists them newest first, and hands each new
/// record to the notification queue.
pub struct QuoteIntakeService {
    repository: Arc<dyn QuoteRepository>,
    notifications: NotificationDispatcher,
    // Serializes the load/prepend/save cycle within this process.
    write_lock: Mutex<()>,
}

impl QuoteIntakeService {
    pub fn new(repository: Arc<dyn QuoteRepository>, notifications: NotificationDispatcher) -> Self {
        Self { repository, notifications, write_lock: Mutex::new(()) }
    }

    pub async fn submit(&self, submission: &QuoteSubmission) -> Result<QuoteRecord, ApplicationError> {
        let fields = submission.validate()?;

        let record = {
            let _guard = self.write_lock.lock().await;
            let mut quotes = self.repository.load_all().await.map_err(persistence_error)?;
            let now = Utc::now();
            let record = QuoteRecord::new(QuoteId::next(&quotes, now), fields, now);
            quotes.insert(0, QuoteEntry::Record(record.clone()));
            self.repository.save_all(&quotes).await.map_err(persistence_error)?;
            record
        };

        info!(
            event_name = "intake.quote.created",
            quote_id = %record.id,
            notify_enabled = self.notifications.sink_enabled(),
            "quote request stored"
        );

        self.notifications.dispatch(record.clone());
        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<QuoteEntry>, ApplicationError> {
        self.repository.load_all().await.map_err(persistence_error)
    }
}

fn persistence_error(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}
