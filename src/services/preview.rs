//! Preview lifecycle — `Idle | Generating | Rendered` with orthogonal view flags.
//!
//! DESIGN
//! ======
//! One `Preview` value owns the whole display lifecycle. Transitions:
//!
//! | from       | event              | to         |
//! |------------|--------------------|------------|
//! | Idle       | begin_generation   | Generating |
//! | Generating | finish (ok)        | Rendered   |
//! | Generating | finish (err)       | Idle       |
//! | any        | reset              | Idle       |
//!
//! Split view, recording and the copy acknowledgement only exist inside
//! `Rendered`, so they cannot leak across creations. Every generation gets a
//! ticket; a finish carrying a stale ticket (the user reset meanwhile) is
//! dropped instead of resurrecting an abandoned request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::services::creation::{Creation, CreationSummary};
use crate::services::loading::LoadingTicker;
use crate::services::recording::{ChunkSink, RecordingError, RecordingSession};

/// How long the "copied" acknowledgement stays visible.
pub const COPIED_ACK: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("a generation is already in progress")]
    Busy,
    #[error("a creation is already displayed; reset first")]
    CreationActive,
    #[error("no creation is displayed")]
    NoCreation,
    #[error("generation was abandoned by a reset")]
    Abandoned,
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording session {0}")]
    UnknownRecording(Uuid),
    #[error(transparent)]
    Recording(#[from] RecordingError),
}

impl ErrorCode for PreviewError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Busy => "E_BUSY",
            Self::CreationActive => "E_CREATION_ACTIVE",
            Self::NoCreation => "E_NO_CREATION",
            Self::Abandoned => "E_ABANDONED",
            Self::AlreadyRecording => "E_ALREADY_RECORDING",
            Self::UnknownRecording(_) => "E_UNKNOWN_RECORDING",
            Self::Recording(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

// =============================================================================
// STATE
// =============================================================================

pub enum Phase {
    Idle,
    Generating { ticket: Uuid, ticker: LoadingTicker },
    Rendered { creation: Arc<Creation>, view: ViewState },
}

/// View flags that only exist while a creation is displayed.
pub struct ViewState {
    pub split_view: bool,
    recording: Option<RecordingSession>,
    copied_at: Option<Instant>,
    /// Bumped whenever the frame must reload to restart the demo timeline.
    reload_nonce: u64,
}

impl ViewState {
    fn for_creation(creation: &Creation) -> Self {
        Self { split_view: creation.original_image.is_some(), recording: None, copied_at: None, reload_nonce: 0 }
    }
}

/// Returned by [`Preview::start_recording`]: the page reloads the frame when
/// `reload_nonce` changes, then starts its recorder against `session_id`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecordingStart {
    pub session_id: Uuid,
    pub reload_nonce: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    Generating,
    Rendered,
}

/// Serializable view of the preview for the page.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewSnapshot {
    pub phase: PhaseKind,
    pub loading_step: Option<usize>,
    pub loading_label: Option<&'static str>,
    pub creation: Option<CreationSummary>,
    pub split_view: bool,
    pub recording: Option<Uuid>,
    pub copied: bool,
    pub reload_nonce: u64,
    pub last_error: Option<String>,
}

pub struct Preview {
    phase: Phase,
    step_period: Duration,
    last_error: Option<String>,
}

impl Preview {
    #[must_use]
    pub fn new(step_period: Duration) -> Self {
        Self { phase: Phase::Idle, step_period, last_error: None }
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn kind(&self) -> PhaseKind {
        match self.phase {
            Phase::Idle => PhaseKind::Idle,
            Phase::Generating { .. } => PhaseKind::Generating,
            Phase::Rendered { .. } => PhaseKind::Rendered,
        }
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        matches!(self.phase, Phase::Generating { .. })
    }

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Enter `Generating` and start the loading ticker.
    ///
    /// # Errors
    ///
    /// [`PreviewError::Busy`] while another generation runs,
    /// [`PreviewError::CreationActive`] while a creation is displayed.
    pub fn begin_generation(&mut self) -> Result<Uuid, PreviewError> {
        match self.phase {
            Phase::Idle => {}
            Phase::Generating { .. } => return Err(PreviewError::Busy),
            Phase::Rendered { .. } => return Err(PreviewError::CreationActive),
        }
        let ticket = Uuid::new_v4();
        self.last_error = None;
        self.phase = Phase::Generating { ticket, ticker: LoadingTicker::start(self.step_period) };
        info!(%ticket, "preview: generating");
        Ok(ticket)
    }

    /// Resolve the generation identified by `ticket`. Returns `false` when the
    /// ticket is stale and the result was discarded.
    pub fn finish_generation(&mut self, ticket: Uuid, result: Result<Creation, String>) -> bool {
        let current = match &self.phase {
            Phase::Generating { ticket: current, .. } => *current,
            _ => {
                warn!(%ticket, "preview: dropping result for abandoned generation");
                return false;
            }
        };
        if current != ticket {
            warn!(%ticket, %current, "preview: dropping result for stale ticket");
            return false;
        }

        // Replacing the phase drops the ticker, which stops its timer.
        self.phase = match result {
            Ok(creation) => {
                let view = ViewState::for_creation(&creation);
                info!(id = %creation.id, name = %creation.name, split_view = view.split_view, "preview: rendered");
                Phase::Rendered { creation: Arc::new(creation), view }
            }
            Err(message) => {
                warn!(error = %message, "preview: generation failed");
                self.last_error = Some(message);
                Phase::Idle
            }
        };
        true
    }

    /// Return to `Idle` from any state, discarding the creation and any
    /// recording in progress.
    pub fn reset(&mut self) {
        if let Phase::Rendered { view, .. } = &mut self.phase {
            if let Some(session) = view.recording.take() {
                session.abort();
            }
        }
        self.phase = Phase::Idle;
        self.last_error = None;
        info!("preview: reset");
    }

    // =========================================================================
    // RENDERED
    // =========================================================================

    /// The displayed creation.
    ///
    /// # Errors
    ///
    /// [`PreviewError::NoCreation`] outside `Rendered`.
    pub fn creation(&self) -> Result<Arc<Creation>, PreviewError> {
        match &self.phase {
            Phase::Rendered { creation, .. } => Ok(Arc::clone(creation)),
            _ => Err(PreviewError::NoCreation),
        }
    }

    fn rendered_mut(&mut self) -> Result<(&Arc<Creation>, &mut ViewState), PreviewError> {
        match &mut self.phase {
            Phase::Rendered { creation, view } => Ok((&*creation, view)),
            _ => Err(PreviewError::NoCreation),
        }
    }

    /// Flip split view. Returns the new value.
    ///
    /// # Errors
    ///
    /// [`PreviewError::NoCreation`] outside `Rendered`.
    pub fn toggle_split_view(&mut self) -> Result<bool, PreviewError> {
        let (_, view) = self.rendered_mut()?;
        view.split_view = !view.split_view;
        Ok(view.split_view)
    }

    /// Text for "copy prompt"; starts the copied acknowledgement.
    ///
    /// # Errors
    ///
    /// [`PreviewError::NoCreation`] outside `Rendered`.
    pub fn copy_prompt(&mut self) -> Result<String, PreviewError> {
        let (creation, view) = self.rendered_mut()?;
        let text = creation.prompt_text();
        view.copied_at = Some(Instant::now());
        Ok(text)
    }

    /// Reserve a recording session. Nothing is collected and the frame is
    /// left alone until the page has a capture grant and calls
    /// [`start_recording`](Self::start_recording).
    ///
    /// # Errors
    ///
    /// [`PreviewError::NoCreation`] outside `Rendered`,
    /// [`PreviewError::AlreadyRecording`] while a session is active.
    pub fn acquire_recording(&mut self) -> Result<Uuid, PreviewError> {
        let (creation, view) = self.rendered_mut()?;
        if view.recording.is_some() {
            return Err(PreviewError::AlreadyRecording);
        }
        let session = RecordingSession::acquire();
        let session_id = session.id();
        view.recording = Some(session);
        info!(%session_id, creation = %creation.id, "preview: recording acquired");
        Ok(session_id)
    }

    /// Capture was granted: start collecting and ask the frame to reload so
    /// the demo plays from the top.
    ///
    /// # Errors
    ///
    /// Fails when `session_id` is not the active session or it already started.
    pub fn start_recording(&mut self, session_id: Uuid) -> Result<RecordingStart, PreviewError> {
        let (_, view) = self.rendered_mut()?;
        match view.recording.as_mut() {
            Some(session) if session.id() == session_id => session.start()?,
            _ => return Err(PreviewError::UnknownRecording(session_id)),
        }
        view.reload_nonce += 1;
        info!(%session_id, reload_nonce = view.reload_nonce, "preview: recording");
        Ok(RecordingStart { session_id, reload_nonce: view.reload_nonce })
    }

    /// Sending handle for the active session, so chunks are forwarded
    /// without holding the preview lock.
    ///
    /// # Errors
    ///
    /// Fails when `session_id` is not the active session or it has not started.
    pub fn recording_sink(&self, session_id: Uuid) -> Result<ChunkSink, PreviewError> {
        Ok(self.active_recording(session_id)?.chunk_sink()?)
    }

    /// Detach the active session so the caller can `stop` it outside the lock.
    /// The recording flag is cleared immediately.
    ///
    /// # Errors
    ///
    /// Fails when `session_id` is not the active session.
    pub fn take_recording(&mut self, session_id: Uuid) -> Result<(RecordingSession, Arc<Creation>), PreviewError> {
        self.active_recording(session_id)?;
        let (creation, view) = self.rendered_mut()?;
        let creation = Arc::clone(creation);
        let session = view
            .recording
            .take()
            .ok_or(PreviewError::UnknownRecording(session_id))?;
        Ok((session, creation))
    }

    /// Capture was denied, unsupported or failed to start: drop the session
    /// without output.
    ///
    /// # Errors
    ///
    /// Fails when `session_id` is not the active session.
    pub fn abort_recording(&mut self, session_id: Uuid) -> Result<(), PreviewError> {
        let (session, _) = self.take_recording(session_id)?;
        session.abort();
        Ok(())
    }

    fn active_recording(&self, session_id: Uuid) -> Result<&RecordingSession, PreviewError> {
        let Phase::Rendered { view, .. } = &self.phase else {
            return Err(PreviewError::NoCreation);
        };
        match &view.recording {
            Some(session) if session.id() == session_id => Ok(session),
            _ => Err(PreviewError::UnknownRecording(session_id)),
        }
    }

    // =========================================================================
    // SNAPSHOT
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> PreviewSnapshot {
        let mut snapshot = PreviewSnapshot {
            phase: self.kind(),
            loading_step: None,
            loading_label: None,
            creation: None,
            split_view: false,
            recording: None,
            copied: false,
            reload_nonce: 0,
            last_error: self.last_error.clone(),
        };
        match &self.phase {
            Phase::Idle => {}
            Phase::Generating { ticker, .. } => {
                snapshot.loading_step = Some(ticker.step());
                snapshot.loading_label = Some(ticker.label());
            }
            Phase::Rendered { creation, view } => {
                snapshot.creation = Some(creation.summary());
                snapshot.split_view = view.split_view;
                snapshot.recording = view.recording.as_ref().map(RecordingSession::id);
                snapshot.copied = view.copied_at.is_some_and(|at| at.elapsed() < COPIED_ACK);
                snapshot.reload_nonce = view.reload_nonce;
            }
        }
        snapshot
    }
}

#[cfg(test)]
#[path = "preview_test.rs"]
mod tests;
