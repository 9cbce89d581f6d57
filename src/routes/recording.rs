//! Recording routes — the server half of the page's `MediaRecorder` bridge.
//!
//! The page acquires a session, asks the browser for capture, and only on a
//! grant calls `start`, which reloads the frame so the demo plays from the
//! top. It then posts every recorder chunk and calls `stop` once the user
//! ends sharing. Denied or unsupported capture ends with `abort`.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::ApiError;
use crate::services::preview::RecordingStart;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AcquireResponse {
    pub session_id: Uuid,
}

/// `POST /api/recording`: reserve a session before asking for capture.
pub async fn acquire(State(state): State<AppState>) -> Result<Json<AcquireResponse>, ApiError> {
    let session_id = state.preview.write().await.acquire_recording()?;
    Ok(Json(AcquireResponse { session_id }))
}

/// `POST /api/recording/{id}/start`: capture granted, start collecting and
/// reload the frame.
pub async fn start(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<RecordingStart>, ApiError> {
    let started = state.preview.write().await.start_recording(id)?;
    Ok(Json(started))
}

/// `POST /api/recording/{id}/chunk`: raw chunk bytes as the body.
pub async fn chunk(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let sink = state.preview.read().await.recording_sink(id)?;
    sink.push(body.to_vec()).await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/recording/{id}/stop`: the assembled video, or 204 when no
/// data ever arrived.
pub async fn stop(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response, ApiError> {
    let (session, creation) = state.preview.write().await.take_recording(id)?;

    let Some(recording) = session.stop().await? else {
        info!(%id, "recording: no data, nothing to download");
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let filename = creation.video_filename();
    info!(%id, %filename, bytes = recording.bytes.len(), duration_ms = recording.duration.as_millis(), "recording: download");
    Ok((
        [
            (CONTENT_TYPE, recording.mime_type.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        recording.bytes,
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
struct AbortBody {
    #[serde(default)]
    reason: Option<String>,
}

/// `POST /api/recording/{id}/abort`: capture denied, unsupported or failed
/// to start. Body `{ "reason": "..." }` is optional.
pub async fn abort(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let reason = serde_json::from_slice::<AbortBody>(&body)
        .unwrap_or_default()
        .reason
        .unwrap_or_else(|| "unspecified".into());
    warn!(%id, %reason, "recording: capture aborted");
    state.preview.write().await.abort_recording(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "recording_test.rs"]
mod tests;
