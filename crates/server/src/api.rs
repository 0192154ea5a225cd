//! Public HTTP surface.
//!
//! - `GET  /`            liveness text
//! - `GET  /api/quotes`  full collection, requires `x-admin-key`
//! - `POST /api/quotes`  submit a quote request

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use quotedesk_core::{
    AdminGuard, ApplicationError, InterfaceError, QuoteEntry, QuoteRecord, QuoteSubmission,
    ADMIN_KEY_HEADER,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::intake::QuoteIntakeService;

pub const LIVENESS_MESSAGE: &str = "Backend An Phát đang chạy 🚀";

#[derive(Clone)]
pub struct ApiState {
    intake: Arc<QuoteIntakeService>,
    guard: AdminGuard,
}

impl ApiState {
    pub fn new(intake: Arc<QuoteIntakeService>, guard: AdminGuard) -> Self {
        Self { intake, guard }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub ok: bool,
    pub item: QuoteRecord,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub ok: bool,
    pub error: String,
}

type ApiFailure = (StatusCode, Json<ApiError>);

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/api/quotes", get(list_quotes).post(submit_quote))
        .with_state(state)
}

/// Extractor that admits the request only when `x-admin-key` matches.
pub struct AdminAccess;

impl FromRequestParts<ApiState> for AdminAccess {
    type Rejection = ApiFailure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let supplied = parts.headers.get(ADMIN_KEY_HEADER).and_then(|value| value.to_str().ok());
        if state.guard.authorize(supplied) {
            return Ok(Self);
        }

        let correlation_id = correlation_id();
        warn!(
            event_name = "api.admin.unauthorized",
            correlation_id = %correlation_id,
            key_present = supplied.is_some(),
            path = %parts.uri.path(),
            "admin key rejected"
        );
        Err(failure(ApplicationError::Unauthorized.into_interface(correlation_id)))
    }
}

async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

async fn list_quotes(
    _admin: AdminAccess,
    State(state): State<ApiState>,
) -> Result<Json<Vec<QuoteEntry>>, ApiFailure> {
    let quotes = state.intake.list().await.map_err(|error| {
        let interface = error.into_interface(correlation_id());
        log_failure("api.quotes.list_failed", &interface);
        failure(interface)
    })?;

    Ok(Json(quotes))
}

async fn submit_quote(
    State(state): State<ApiState>,
    payload: Result<Json<QuoteSubmission>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiFailure> {
    let correlation_id = correlation_id();

    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            let interface = InterfaceError::BadRequest {
                message: rejection.body_text(),
                correlation_id,
            };
            log_failure("api.quotes.body_rejected", &interface);
            return Err(failure(interface));
        }
    };

    match state.intake.submit(&submission).await {
        Ok(item) => {
            info!(
                event_name = "api.quotes.created",
                correlation_id = %correlation_id,
                quote_id = %item.id,
                "quote request accepted"
            );
            Ok(Json(SubmitResponse { ok: true, item }))
        }
        Err(error) => {
            let interface = error.into_interface(correlation_id);
            log_failure("api.quotes.submit_failed", &interface);
            Err(failure(interface))
        }
    }
}

fn failure(interface: InterfaceError) -> ApiFailure {
    let status =
        StatusCode::from_u16(interface.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError { ok: false, error: interface.user_message().to_string() }))
}

fn log_failure(event_name: &'static str, interface: &InterfaceError) {
    let correlation_id = interface.correlation_id();
    match interface {
        InterfaceError::Internal { message, .. } => error!(
            event_name,
            correlation_id,
            error = %message,
            "request failed"
        ),
        InterfaceError::BadRequest { message, .. } => info!(
            event_name,
            correlation_id,
            detail = %message,
            "request rejected"
        ),
        InterfaceError::Unauthorized { .. } => {
            warn!(event_name, correlation_id, "request unauthorized")
        }
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}
