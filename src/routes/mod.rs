//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API the browser shell talks to. The shell
//! itself (form, sandboxed frame, recorder bridge) is served as static files
//! at `/`.

pub mod exports;
pub mod recording;
pub mod studio;

use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ErrorCode;
use crate::services::attachment::AttachmentError;
use crate::services::generation::GenerationError;
use crate::services::preview::PreviewError;
use crate::services::recording::RecordingError;
use crate::services::studio::StudioError;
use crate::state::AppState;

/// Uploads and recorder chunks can be far larger than axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// API routes used by the browser shell.
pub fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/state", get(studio::get_state))
        .route("/api/attachments", get(studio::list_attachments).post(studio::add_attachments))
        .route("/api/attachments/{index}", delete(studio::remove_attachment))
        .route("/api/generate", post(studio::generate))
        .route("/api/reset", post(studio::reset))
        .route("/api/view/split", post(studio::toggle_split_view))
        .route("/api/creation/document", get(exports::document))
        .route("/api/creation/download", get(exports::download))
        .route("/api/creation/prompt", get(exports::prompt))
        .route("/api/recording", post(recording::acquire))
        .route("/api/recording/{id}/start", post(recording::start))
        .route("/api/recording/{id}/chunk", post(recording::chunk))
        .route("/api/recording/{id}/stop", post(recording::stop))
        .route("/api/recording/{id}/abort", post(recording::abort))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Full application: API routes plus the static browser shell.
pub fn app(state: AppState, static_dir: PathBuf) -> Router {
    let shell = ServeDir::new(&static_dir).append_index_html_on_directories(true);
    api_routes(state)
        .fallback_service(shell)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// API ERROR
// =============================================================================

/// JSON error body: `{ code, message, retryable }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code: "E_BAD_REQUEST", message: message.into(), retryable: false }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "code": self.code,
            "message": self.message,
            "retryable": self.retryable,
        });
        (self.status, Json(body)).into_response()
    }
}

pub(crate) fn generation_error_to_status(err: &GenerationError) -> StatusCode {
    match err {
        GenerationError::EmptyInput => StatusCode::BAD_REQUEST,
        GenerationError::LlmNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        GenerationError::Llm(_) => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn preview_error_to_status(err: &PreviewError) -> StatusCode {
    match err {
        PreviewError::Busy | PreviewError::CreationActive | PreviewError::AlreadyRecording | PreviewError::Abandoned => {
            StatusCode::CONFLICT
        }
        PreviewError::NoCreation | PreviewError::UnknownRecording(_) => StatusCode::NOT_FOUND,
        PreviewError::Recording(RecordingError::NotStarted(_) | RecordingError::AlreadyStarted(_)) => {
            StatusCode::CONFLICT
        }
        PreviewError::Recording(RecordingError::CollectorLost(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        Self::new(generation_error_to_status(&err), &err)
    }
}

impl From<PreviewError> for ApiError {
    fn from(err: PreviewError) -> Self {
        Self::new(preview_error_to_status(&err), &err)
    }
}

impl From<RecordingError> for ApiError {
    fn from(err: RecordingError) -> Self {
        PreviewError::Recording(err).into()
    }
}

impl From<StudioError> for ApiError {
    fn from(err: StudioError) -> Self {
        match err {
            StudioError::Generation(e) => e.into(),
            StudioError::Preview(e) => e.into(),
            e @ StudioError::TaskFailed(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, &e),
        }
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        let status = match err {
            AttachmentError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            AttachmentError::Unreadable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, &err)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
