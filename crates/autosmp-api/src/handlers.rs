//! Operator API handlers.
//!
//! Tunable and toggle resources speak plain text. Errors and the
//! structured endpoints use the JSON envelope.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};

use autosmp_core::TunableError;
use autosmp_governor::GovernorError;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn tunable_error(e: &TunableError) -> Response {
    let status = match e {
        TunableError::UnknownTunable(_) => StatusCode::NOT_FOUND,
        TunableError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
    };
    error_response(&e.to_string(), status)
}

fn governor_error(e: &GovernorError) -> Response {
    match e {
        GovernorError::Tunable(inner) => tunable_error(inner),
        GovernorError::Closed | GovernorError::Spawn(_) => {
            error_response(&e.to_string(), StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

fn text(value: impl std::fmt::Display) -> Response {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        format!("{value}\n"),
    )
        .into_response()
}

// ── Tunables ───────────────────────────────────────────────────

/// GET /conf
pub async fn list_tunables(State(state): State<ApiState>) -> impl IntoResponse {
    let entries: BTreeMap<&str, u32> = state.governor.tunables().entries().into_iter().collect();
    ApiResponse::ok(entries)
}

/// GET /conf/{name}
pub async fn get_tunable(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.governor.get(&name) {
        Ok(value) => text(value),
        Err(e) => tunable_error(&e),
    }
}

/// PUT /conf/{name}
pub async fn set_tunable(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: String,
) -> impl IntoResponse {
    match state.governor.set(&name, &body) {
        Ok(value) => text(value),
        Err(e) => {
            debug!(%name, error = %e, "tunable write rejected");
            tunable_error(&e)
        }
    }
}

// ── Toggle ─────────────────────────────────────────────────────

/// GET /enabled
pub async fn get_enabled(State(state): State<ApiState>) -> impl IntoResponse {
    text(u8::from(state.governor.enabled()))
}

/// PUT /enabled
pub async fn set_enabled(State(state): State<ApiState>, body: String) -> impl IntoResponse {
    match state.governor.set_enabled_str(&body) {
        Ok(enabled) => {
            info!(enabled, "toggle written");
            text(u8::from(enabled))
        }
        Err(e) => governor_error(&e),
    }
}

// ── Status & signals ───────────────────────────────────────────

/// GET /status
pub async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.governor.status())
}

/// POST /suspend
pub async fn suspend(State(state): State<ApiState>) -> impl IntoResponse {
    match state.governor.suspend() {
        Ok(()) => (StatusCode::ACCEPTED, ApiResponse::ok("suspend queued")).into_response(),
        Err(e) => governor_error(&e),
    }
}

/// POST /resume
pub async fn resume(State(state): State<ApiState>) -> impl IntoResponse {
    match state.governor.resume() {
        Ok(()) => (StatusCode::ACCEPTED, ApiResponse::ok("resume queued")).into_response(),
        Err(e) => governor_error(&e),
    }
}
