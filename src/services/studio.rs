//! Studio controller — submit flow from queued inputs to a displayed creation.
//!
//! DESIGN
//! ======
//! `submit` is the only place that sequences the collector, the generation
//! client and the preview:
//!
//! 1. drain the collector once and validate against what was drained; a
//!    refused submit puts the files back
//! 2. enter `Generating` (rejects a second submit)
//! 3. encode attachments, re-check for empty input, call the model with no
//!    lock held
//! 4. resolve the preview with the creation or the error
//!
//! The flow runs in its own task. The HTTP request only waits for it, so a
//! client that disconnects mid-generation cannot leave the preview stuck in
//! `Generating`: the ticket is always resolved, and a reset meanwhile makes
//! the late result stale.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::llm::LlmGenerate;
use crate::services::attachment::{Attachment, PendingFile, encode_all};
use crate::services::creation::{Creation, derive_name};
use crate::services::generation::{self, GenerationError};
use crate::services::preview::PreviewError;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Preview(#[from] PreviewError),
    #[error("generation task failed: {0}")]
    TaskFailed(String),
}

impl ErrorCode for StudioError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Generation(e) => e.error_code(),
            Self::Preview(e) => e.error_code(),
            Self::TaskFailed(_) => "E_GENERATION_TASK",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Generation(e) => e.retryable(),
            Self::Preview(e) => e.retryable(),
            Self::TaskFailed(_) => false,
        }
    }
}

/// What a successful submit produced.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub creation: Arc<Creation>,
    /// Names of attachments that could not be read and were left out.
    pub skipped: Vec<String>,
}

/// Run one generation with the queued attachments.
///
/// Dropping the returned future does not cancel the generation; it still
/// resolves the preview when the model answers.
///
/// # Errors
///
/// Returns a [`StudioError`] if the input is empty, the LLM is not
/// configured, a generation is already running, a creation is already shown,
/// or the model call fails. On failure the preview is back in `Idle` or was
/// never left.
pub async fn submit(state: &AppState, url: &str, instructions: &str) -> Result<SubmitOutcome, StudioError> {
    let task = tokio::spawn(run_submit(state.clone(), url.trim().to_owned(), instructions.trim().to_owned()));
    task.await.map_err(|e| StudioError::TaskFailed(e.to_string()))?
}

async fn run_submit(state: AppState, url: String, instructions: String) -> Result<SubmitOutcome, StudioError> {
    let files = state.attachments.lock().await.take();
    let (llm, ticket) = match begin(&state, &url, &instructions, files.len()).await {
        Ok(started) => started,
        Err(e) => {
            state.attachments.lock().await.restore(files);
            return Err(e);
        }
    };

    let work = tokio::spawn(produce(llm, url.clone(), instructions.clone(), files));
    let produced = match work.await {
        Ok(produced) => produced,
        Err(e) => {
            error!(error = %e, %ticket, "studio: generation task failed");
            state
                .preview
                .write()
                .await
                .finish_generation(ticket, Err(e.to_string()));
            return Err(StudioError::TaskFailed(e.to_string()));
        }
    };

    let mut preview = state.preview.write().await;
    match produced.html {
        Ok(html) => {
            let original_image = produced.attachments.first().map(Attachment::data_url);
            let creation = Creation::new(derive_name(&url, &instructions), html, original_image);
            if !preview.finish_generation(ticket, Ok(creation)) {
                return Err(PreviewError::Abandoned.into());
            }
            let creation = preview.creation()?;
            info!(id = %creation.id, name = %creation.name, "studio: creation ready");
            Ok(SubmitOutcome { creation, skipped: produced.skipped })
        }
        Err(e) => {
            preview.finish_generation(ticket, Err(e.to_string()));
            Err(e.into())
        }
    }
}

/// Validate and enter `Generating`.
async fn begin(
    state: &AppState,
    url: &str,
    instructions: &str,
    file_count: usize,
) -> Result<(Arc<dyn LlmGenerate>, Uuid), StudioError> {
    generation::validate_input(url, instructions, file_count)?;
    let llm = state.llm.clone().ok_or(GenerationError::LlmNotConfigured)?;
    let ticket = state.preview.write().await.begin_generation()?;
    Ok((llm, ticket))
}

struct Produced {
    html: Result<String, GenerationError>,
    attachments: Vec<Attachment>,
    skipped: Vec<String>,
}

async fn produce(llm: Arc<dyn LlmGenerate>, url: String, instructions: String, files: Vec<PendingFile>) -> Produced {
    let batch = encode_all(&files).await;
    if !batch.skipped.is_empty() {
        warn!(skipped = ?batch.skipped, "studio: some attachments were left out");
    }

    // Every attachment may have been unreadable.
    let html = match generation::validate_input(&url, &instructions, batch.attachments.len()) {
        Ok(()) => generation::generate(llm.as_ref(), &url, &instructions, &batch.attachments).await,
        Err(e) => Err(e),
    };
    Produced { html, attachments: batch.attachments, skipped: batch.skipped }
}

#[cfg(test)]
#[path = "studio_test.rs"]
mod tests;
