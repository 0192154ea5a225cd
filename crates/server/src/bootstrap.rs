use std::sync::Arc;

use axum::Router;
use quotedesk_core::config::AppConfig;
use quotedesk_core::{AdminGuard, DisabledNotificationSink, NotificationSink};
use quotedesk_db::{open_with_settings, RepositoryError};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::api::{self, ApiState};
use crate::health::{self, HealthState};
use crate::intake::QuoteIntakeService;
use crate::mail::{MailError, SmtpNotificationSink};
use crate::notifier::{NotificationDispatcher, NotificationWorker};

pub struct Application {
    pub config: AppConfig,
    pub router: Router,
    pub notification_worker: NotificationWorker,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("data storage unavailable: {0}")]
    Storage(#[source] RepositoryError),
    #[error("mail notifications misconfigured: {0}")]
    Mail(#[source] MailError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    if config.admin.is_default_key() {
        warn!(
            event_name = "system.bootstrap.default_admin_key",
            correlation_id = "bootstrap",
            "admin key is the built-in default; set QUOTEDESK_ADMIN_KEY or ADMIN_KEY"
        );
    }

    let repository = open_with_settings(&config.storage).await.map_err(BootstrapError::Storage)?;
    info!(
        event_name = "system.bootstrap.storage_ready",
        correlation_id = "bootstrap",
        data_file = %repository.path().display(),
        "quote storage ready"
    );

    let sink: Arc<dyn NotificationSink> = match config.mail.credentials() {
        Some(credentials) => {
            let sink =
                SmtpNotificationSink::new(&config.mail, credentials).map_err(BootstrapError::Mail)?;
            info!(
                event_name = "system.bootstrap.notifications_enabled",
                correlation_id = "bootstrap",
                smtp_host = %config.mail.smtp_host,
                "new quote notifications enabled"
            );
            Arc::new(sink)
        }
        None => {
            let missing = config.mail.missing_settings();
            warn!(
                event_name = "system.bootstrap.notifications_disabled",
                correlation_id = "bootstrap",
                missing = %missing.join(","),
                "mail settings incomplete, quotes will be stored without notification"
            );
            Arc::new(DisabledNotificationSink::new(missing))
        }
    };

    let notifications_enabled = sink.is_enabled();
    let (dispatcher, notification_worker) =
        NotificationDispatcher::spawn(sink, config.mail.queue_capacity);
    let intake = Arc::new(QuoteIntakeService::new(Arc::new(repository), dispatcher));

    let router = api::router(ApiState::new(intake, AdminGuard::new(&config.admin)))
        .merge(health::router(HealthState::new(&config.storage, notifications_enabled)))
        .layer(CorsLayer::permissive());

    Ok(Application { config, router, notification_worker })
}
