use std::path::PathBuf;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use quotedesk_core::config::StorageConfig;
use quotedesk_db::probe_writable;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    data_dir: PathBuf,
    notifications_enabled: bool,
}

impl HealthState {
    pub fn new(storage: &StorageConfig, notifications_enabled: bool) -> Self {
        Self { data_dir: storage.data_dir.clone(), notifications_enabled }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: HealthCheck,
    pub notifications: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = storage_check(&state.data_dir).await;
    let ready = storage.status == "ready";

    let notifications = if state.notifications_enabled {
        HealthCheck { status: "enabled", detail: "smtp notifications configured".to_string() }
    } else {
        HealthCheck {
            status: "disabled",
            detail: "mail settings incomplete, notifications are skipped".to_string(),
        }
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        storage,
        notifications,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn storage_check(data_dir: &std::path::Path) -> HealthCheck {
    match probe_writable(data_dir).await {
        Ok(()) => HealthCheck {
            status: "ready",
            detail: format!("data directory `{}` is writable", data_dir.display()),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("data directory `{}` is not writable: {error}", data_dir.display()),
        },
    }
}
