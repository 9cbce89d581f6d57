//! Studio routes — inputs, generation and view toggles.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ApiError;
use crate::services::attachment::{
    AttachmentCollector, AttachmentSource, FileBody, PendingFile, PendingFileInfo, mime_from_extension,
};
use crate::services::creation::CreationSummary;
use crate::services::preview::PreviewSnapshot;
use crate::services::studio;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub preview: PreviewSnapshot,
    pub attachments: Vec<PendingFileInfo>,
    pub llm_configured: bool,
}

/// `GET /api/state`: everything the page renders.
pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let preview = state.preview.read().await.snapshot();
    let attachments = state.attachments.lock().await.list();
    Json(StateResponse { preview, attachments, llm_configured: state.llm.is_some() })
}

// =============================================================================
// ATTACHMENTS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub accepted: usize,
    /// Files the origin filter refused (non-images from drop or paste).
    pub rejected: Vec<String>,
    pub attachments: Vec<PendingFileInfo>,
}

pub async fn list_attachments(State(state): State<AppState>) -> Json<Vec<PendingFileInfo>> {
    Json(state.attachments.lock().await.list())
}

/// `POST /api/attachments`: multipart upload.
///
/// An optional `source` text field (`file_picker`, `drag_drop`, `paste`)
/// applies to the file fields that follow it; the default is `file_picker`.
pub async fn add_attachments(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut source = AttachmentSource::FilePicker;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() == Some("source") {
            let raw = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            source = AttachmentSource::parse(raw.trim())
                .ok_or_else(|| ApiError::bad_request(format!("unknown attachment source: {raw}")))?;
            continue;
        }

        let name = field
            .file_name()
            .map_or_else(|| format!("upload-{}", files.len() + 1), str::to_owned);
        let mime_type = field
            .content_type()
            .map_or_else(|| mime_from_extension(&name).to_owned(), str::to_owned);
        match field.bytes().await {
            Ok(bytes) => files.push((source, pending_upload(name, mime_type, bytes.to_vec()))),
            Err(e) => {
                warn!(error = %e, %name, "attachments: failed to read upload");
                return Err(ApiError::bad_request(e.to_string()));
            }
        }
    }

    let mut collector = state.attachments.lock().await;
    let (accepted, rejected) = queue_uploads(&mut collector, files);
    info!(accepted, rejected = rejected.len(), total = collector.len(), "attachments: queued");
    Ok(Json(UploadResponse { accepted, rejected, attachments: collector.list() }))
}

fn pending_upload(name: String, mime_type: String, bytes: Vec<u8>) -> PendingFile {
    PendingFile { name, mime_type, body: FileBody::Bytes(bytes) }
}

fn queue_uploads(
    collector: &mut AttachmentCollector,
    files: Vec<(AttachmentSource, PendingFile)>,
) -> (usize, Vec<String>) {
    let mut accepted = 0;
    let mut rejected = Vec::new();
    for (source, file) in files {
        let name = file.name.clone();
        if collector.add(source, file) {
            accepted += 1;
        } else {
            rejected.push(name);
        }
    }
    (accepted, rejected)
}

/// `DELETE /api/attachments/{index}`
pub async fn remove_attachment(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<PendingFileInfo>>, ApiError> {
    let mut collector = state.attachments.lock().await;
    let removed = collector.remove(index)?;
    info!(index, name = %removed.name, "attachments: removed");
    Ok(Json(collector.list()))
}

// =============================================================================
// GENERATION
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub creation: CreationSummary,
    pub skipped: Vec<String>,
}

/// `POST /api/generate`
pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let outcome = studio::submit(&state, &body.url, &body.instructions).await?;
    Ok(Json(GenerateResponse { creation: outcome.creation.summary(), skipped: outcome.skipped }))
}

/// `POST /api/reset`: back to the input form.
pub async fn reset(State(state): State<AppState>) -> StatusCode {
    state.preview.write().await.reset();
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
pub struct SplitViewResponse {
    pub split_view: bool,
}

/// `POST /api/view/split`
pub async fn toggle_split_view(State(state): State<AppState>) -> Result<Json<SplitViewResponse>, ApiError> {
    let split_view = state.preview.write().await.toggle_split_view()?;
    Ok(Json(SplitViewResponse { split_view }))
}

#[cfg(test)]
#[path = "studio_test.rs"]
mod tests;
