//! Bounded fire-and-forget queue between quote intake and the notification sink.

use std::sync::Arc;
use std::time::Duration;

use quotedesk_core::{NotificationOutcome, NotificationSink, QuoteRecord};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<QuoteRecord>,
    sink_enabled: bool,
}

pub struct NotificationWorker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl NotificationDispatcher {
    pub fn spawn(
        sink: Arc<dyn NotificationSink>,
        capacity: usize,
    ) -> (Self, NotificationWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (shutdown, shutdown_rx) = oneshot::channel();
        let sink_enabled = sink.is_enabled();
        let handle = tokio::spawn(run_worker(sink, receiver, shutdown_rx));

        (Self { sender, sink_enabled }, NotificationWorker { shutdown, handle })
    }

    pub fn sink_enabled(&self) -> bool {
        self.sink_enabled
    }

    /// Enqueues without waiting. Returns false when the record was dropped
    /// because the queue is full or the worker has stopped.
    pub fn dispatch(&self, record: QuoteRecord) -> bool {
        let quote_id = record.id;
        match self.sender.try_send(record) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    event_name = "notify.queue.full",
                    quote_id = %quote_id,
                    "notification queue full, dropping notification"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(
                    event_name = "notify.queue.closed",
                    quote_id = %quote_id,
                    "notification worker stopped, dropping notification"
                );
                false
            }
        }
    }
}

impl NotificationWorker {
    /// Stops intake, delivers what is already queued, and waits at most
    /// `timeout` for that to finish.
    pub async fn drain(self, timeout: Duration) {
        let _ = self.shutdown.send(());
        match tokio::time::timeout(timeout, self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(join_error)) => error!(
                event_name = "notify.worker.panicked",
                error = %join_error,
                "notification worker terminated abnormally"
            ),
            Err(_) => warn!(
                event_name = "notify.worker.drain_timeout",
                timeout_secs = timeout.as_secs(),
                "notification queue not drained before shutdown deadline"
            ),
        }
    }
}

async fn run_worker(
    sink: Arc<dyn NotificationSink>,
    mut receiver: mpsc::Receiver<QuoteRecord>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            next = receiver.recv() => match next {
                Some(record) => deliver(sink.as_ref(), &record).await,
                None => break,
            },
            _ = &mut shutdown => {
                receiver.close();
                while let Some(record) = receiver.recv().await {
                    deliver(sink.as_ref(), &record).await;
                }
                break;
            }
        }
    }
}

async fn deliver(sink: &dyn NotificationSink, record: &QuoteRecord) {
    let outcome = sink.notify(record).await;
    let label = outcome.label();
    match outcome {
        NotificationOutcome::Delivered => info!(
            event_name = "notify.quote.delivered",
            quote_id = %record.id,
            outcome = label,
            "new quote notification sent"
        ),
        NotificationOutcome::Skipped { reason } => info!(
            event_name = "notify.quote.skipped",
            quote_id = %record.id,
            outcome = label,
            reason = %reason,
            "new quote notification skipped"
        ),
        NotificationOutcome::Failed { reason } => error!(
            event_name = "notify.quote.failed",
            quote_id = %record.id,
            outcome = label,
            reason = %reason,
            "new quote notification failed"
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use quotedesk_core::{NotificationOutcome, NotificationSink, QuoteId, QuoteRecord};
    use tokio::sync::{Mutex, Notify};

    use super::NotificationDispatcher;

    /// Test sink that remembers every record it was handed.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) seen: Mutex<Vec<QuoteRecord>>,
        pub(crate) fail: bool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, record: &QuoteRecord) -> NotificationOutcome {
            self.seen.lock().await.push(record.clone());
            if self.fail {
                NotificationOutcome::Failed { reason: "relay refused".to_string() }
            } else {
                NotificationOutcome::Delivered
            }
        }
    }

    /// Holds every delivery until released, to fill the queue deterministically.
    struct BlockingSink {
        release: Notify,
    }

    #[async_trait]
    impl NotificationSink for BlockingSink {
        async fn notify(&self, _record: &QuoteRecord) -> NotificationOutcome {
            self.release.notified().await;
            NotificationOutcome::Delivered
        }
    }

    fn record(id: i64) -> QuoteRecord {
        QuoteRecord {
            id: QuoteId(id),
            fullname: "Anna".to_string(),
            phone: "0123".to_string(),
            email: "a@x.com".to_string(),
            message: "Quote please".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn drain_delivers_everything_already_queued() {
        let sink = Arc::new(RecordingSink::default());
        let (dispatcher, worker) = NotificationDispatcher::spawn(sink.clone(), 8);

        assert!(dispatcher.dispatch(record(1)));
        assert!(dispatcher.dispatch(record(2)));
        worker.drain(Duration::from_secs(5)).await;

        let ids: Vec<i64> = sink.seen.lock().await.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn failed_delivery_keeps_the_worker_running() {
        let sink = Arc::new(RecordingSink { fail: true, ..RecordingSink::default() });
        let (dispatcher, worker) = NotificationDispatcher::spawn(sink.clone(), 8);

        assert!(dispatcher.dispatch(record(1)));
        assert!(dispatcher.dispatch(record(2)));
        worker.drain(Duration::from_secs(5)).await;

        assert_eq!(sink.seen.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn dispatch_after_drain_is_dropped() {
        let sink = Arc::new(RecordingSink::default());
        let (dispatcher, worker) = NotificationDispatcher::spawn(sink.clone(), 8);
        worker.drain(Duration::from_secs(5)).await;

        assert!(!dispatcher.dispatch(record(1)));
        assert!(sink.seen.lock().await.is_empty());
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let sink = Arc::new(BlockingSink { release: Notify::new() });
        let (dispatcher, worker) = NotificationDispatcher::spawn(sink.clone(), 1);

        // The worker takes the first record and blocks on it; the second fills
        // the single slot; the third has nowhere to go.
        assert!(dispatcher.dispatch(record(1)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(dispatcher.dispatch(record(2)));
        assert!(!dispatcher.dispatch(record(3)));

        sink.release.notify_waiters();
        worker.drain(Duration::from_millis(100)).await;
    }
}
