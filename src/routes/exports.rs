//! Export routes for the displayed creation: sandboxed document, download and
//! narration prompt.

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_SECURITY_POLICY, CONTENT_TYPE};
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use tracing::info;

use super::ApiError;
use crate::state::AppState;

/// The generated document runs scripts but stays in its own sandbox; this is
/// the header form of the frame's `sandbox` attribute.
pub const DOCUMENT_SANDBOX: &str = "sandbox allow-scripts allow-forms allow-popups allow-modals allow-same-origin";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// `GET /api/creation/document`: the document the preview frame loads.
pub async fn document(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let creation = state.preview.read().await.creation()?;
    Ok((
        [
            (CONTENT_TYPE, HTML_CONTENT_TYPE.to_string()),
            (CONTENT_SECURITY_POLICY, DOCUMENT_SANDBOX.to_string()),
            (CACHE_CONTROL, "no-store".to_string()),
        ],
        creation.html.clone(),
    ))
}

/// `GET /api/creation/download`: the document as `<name>.html`.
pub async fn download(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let creation = state.preview.read().await.creation()?;
    let filename = creation.document_filename();
    info!(id = %creation.id, %filename, "exports: download");
    Ok((
        [
            (CONTENT_TYPE, HTML_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        creation.html.clone(),
    ))
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub text: String,
    pub copied: bool,
}

/// `GET /api/creation/prompt`: text for the clipboard. Marks the copy so the
/// snapshot shows the acknowledgement for a moment.
pub async fn prompt(State(state): State<AppState>) -> Result<Json<PromptResponse>, ApiError> {
    let text = state.preview.write().await.copy_prompt()?;
    Ok(Json(PromptResponse { text, copied: true }))
}

#[cfg(test)]
#[path = "exports_test.rs"]
mod tests;
