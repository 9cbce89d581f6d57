//! Recording session — server side of the page's screen capture.
//!
//! DESIGN
//! ======
//! The browser owns the capture stream and the `MediaRecorder`; it posts each
//! data chunk here. A session moves through explicit phases:
//!
//! - acquire: allocate the session, nothing is collected yet
//! - start: spawn a collector task fed by an mpsc channel
//! - stop: close the channel; the collector assembles every chunk into one
//!   buffer and resolves a oneshot with it
//! - release: dropping the session (or `abort`) tears the collector down
//!
//! A session stopped before any chunk arrived resolves to `None`, so no empty
//! video file is ever produced.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Container and codec of the assembled video.
pub const VIDEO_MIME: &str = "video/webm;codecs=vp9";

const CHUNK_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    #[error("recording session {0} has not been started")]
    NotStarted(Uuid),
    #[error("recording session {0} already started")]
    AlreadyStarted(Uuid),
    #[error("recording session {0} collector stopped unexpectedly")]
    CollectorLost(Uuid),
}

impl crate::error::ErrorCode for RecordingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotStarted(_) => "E_RECORDING_NOT_STARTED",
            Self::AlreadyStarted(_) => "E_RECORDING_ALREADY_STARTED",
            Self::CollectorLost(_) => "E_RECORDING_COLLECTOR_LOST",
        }
    }
}

/// A finished capture, ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub chunk_count: usize,
    pub duration: Duration,
}

pub struct RecordingSession {
    id: Uuid,
    chunks: Option<mpsc::Sender<Vec<u8>>>,
    result: Option<oneshot::Receiver<Option<Recording>>>,
    collector: Option<JoinHandle<()>>,
}

impl RecordingSession {
    /// Allocate a session. No collector runs until [`start`](Self::start).
    #[must_use]
    pub fn acquire() -> Self {
        Self { id: Uuid::new_v4(), chunks: None, result: None, collector: None }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.chunks.is_some()
    }

    /// Spawn the chunk collector.
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::AlreadyStarted`] when called twice.
    pub fn start(&mut self) -> Result<(), RecordingError> {
        if self.collector.is_some() {
            return Err(RecordingError::AlreadyStarted(self.id));
        }

        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(CHUNK_CHANNEL_CAPACITY);
        let (done_tx, done_rx) = oneshot::channel();
        let id = self.id;

        let collector = tokio::spawn(async move {
            let started = Instant::now();
            let mut bytes = Vec::new();
            let mut chunk_count = 0usize;
            while let Some(chunk) = rx.recv().await {
                chunk_count += 1;
                bytes.extend_from_slice(&chunk);
            }

            let recording = if bytes.is_empty() {
                None
            } else {
                Some(Recording { bytes, mime_type: VIDEO_MIME, chunk_count, duration: started.elapsed() })
            };
            debug!(%id, chunk_count, "recording: collector finished");
            let _ = done_tx.send(recording);
        });

        self.chunks = Some(tx);
        self.result = Some(done_rx);
        self.collector = Some(collector);
        info!(id = %self.id, "recording: started");
        Ok(())
    }

    /// Hand one recorder data chunk to the collector. Empty chunks are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not started or its collector is gone.
    pub async fn push_chunk(&self, chunk: Vec<u8>) -> Result<(), RecordingError> {
        self.chunk_sink()?.push(chunk).await
    }

    /// Detached handle for feeding chunks without borrowing the session.
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::NotStarted`] before [`start`](Self::start).
    pub fn chunk_sink(&self) -> Result<ChunkSink, RecordingError> {
        let tx = self.chunks.clone().ok_or(RecordingError::NotStarted(self.id))?;
        Ok(ChunkSink { id: self.id, tx })
    }

    /// Close the chunk stream and wait for the assembled recording.
    ///
    /// Returns `Ok(None)` when no data ever arrived, including sessions that
    /// were never started.
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::CollectorLost`] if the collector died first.
    pub async fn stop(mut self) -> Result<Option<Recording>, RecordingError> {
        drop(self.chunks.take());
        let Some(result) = self.result.take() else {
            return Ok(None);
        };
        let recording = result.await.map_err(|_| RecordingError::CollectorLost(self.id))?;
        self.collector = None;
        if let Some(rec) = &recording {
            info!(id = %self.id, bytes = rec.bytes.len(), chunks = rec.chunk_count, "recording: assembled");
        } else {
            info!(id = %self.id, "recording: stopped without data");
        }
        Ok(recording)
    }

    /// Release the session without producing a video.
    pub fn abort(mut self) {
        info!(id = %self.id, "recording: aborted");
        self.release();
    }

    fn release(&mut self) {
        self.chunks = None;
        self.result = None;
        if let Some(collector) = self.collector.take() {
            collector.abort();
        }
    }
}

/// Sending half of a started session. Keep it short-lived: the collector
/// only finishes once every sink is dropped.
pub struct ChunkSink {
    id: Uuid,
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChunkSink {
    /// Forward one chunk. Empty chunks are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::CollectorLost`] if the collector is gone.
    pub async fn push(&self, chunk: Vec<u8>) -> Result<(), RecordingError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx
            .send(chunk)
            .await
            .map_err(|_| RecordingError::CollectorLost(self.id))
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "recording_test.rs"]
mod tests;
