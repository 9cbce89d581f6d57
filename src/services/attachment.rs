//! Attachment collector — reference images queued for the next generation.
//!
//! DESIGN
//! ======
//! Files arrive from three origins: the file picker, drag-and-drop, and
//! clipboard paste. Drag-drop and paste only accept `image/*`; the picker
//! accepts whatever the browser offers. The collector is an ordered list with
//! index removal and no size or count bound.
//!
//! Encoding to base64 happens at submit time. Files are converted
//! concurrently, results keep their slot order, and an unreadable file is
//! skipped and reported without aborting the rest of the batch.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("attachment index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("failed to read {name}: {reason}")]
    Unreadable { name: String, reason: String },
}

impl crate::error::ErrorCode for AttachmentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::IndexOutOfRange { .. } => "E_ATTACHMENT_INDEX",
            Self::Unreadable { .. } => "E_ATTACHMENT_UNREADABLE",
        }
    }
}

/// Where a pending file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentSource {
    FilePicker,
    DragDrop,
    Paste,
}

impl AttachmentSource {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "file_picker" | "picker" => Some(Self::FilePicker),
            "drag_drop" | "drop" => Some(Self::DragDrop),
            "paste" => Some(Self::Paste),
            _ => None,
        }
    }

    /// Whether this origin only admits image MIME types.
    #[must_use]
    pub fn requires_image(self) -> bool {
        matches!(self, Self::DragDrop | Self::Paste)
    }
}

/// Raw file contents, either already in memory (uploads) or still on disk (CLI).
#[derive(Debug, Clone)]
pub enum FileBody {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A file accepted by the collector but not yet encoded.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub mime_type: String,
    pub body: FileBody,
}

impl PendingFile {
    /// Build a pending file for a path, guessing the MIME type from its extension.
    #[must_use]
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let mime_type = mime_from_extension(&name).to_string();
        Self { name, mime_type, body: FileBody::Path(path) }
    }

    async fn read(&self) -> Result<Vec<u8>, AttachmentError> {
        match &self.body {
            FileBody::Bytes(bytes) => Ok(bytes.clone()),
            FileBody::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| AttachmentError::Unreadable { name: self.name.clone(), reason: e.to_string() }),
        }
    }
}

/// Summary of a pending file for the page's thumbnail strip.
#[derive(Debug, Clone, Serialize)]
pub struct PendingFileInfo {
    pub index: usize,
    pub name: String,
    pub mime_type: String,
}

/// One image encoded for transport. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub base64: String,
    pub mime_type: String,
}

impl Attachment {
    #[must_use]
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self { base64: STANDARD.encode(bytes), mime_type: mime_type.into() }
    }

    /// `data:` URL form, used for the split-view reference image.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Output of [`encode_all`]: encoded attachments in slot order plus the names
/// of files that could not be read.
#[derive(Debug, Default)]
pub struct EncodedBatch {
    pub attachments: Vec<Attachment>,
    pub skipped: Vec<String>,
}

// =============================================================================
// COLLECTOR
// =============================================================================

/// Ordered list of files waiting for the next submit.
#[derive(Debug, Default)]
pub struct AttachmentCollector {
    files: Vec<PendingFile>,
}

impl AttachmentCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file. Returns `false` when the origin filters it out.
    pub fn add(&mut self, source: AttachmentSource, file: PendingFile) -> bool {
        if source.requires_image() && !is_image_mime(&file.mime_type) {
            return false;
        }
        self.files.push(file);
        true
    }

    /// Remove the file at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::IndexOutOfRange`] if no file sits at `index`.
    pub fn remove(&mut self, index: usize) -> Result<PendingFile, AttachmentError> {
        if index >= self.files.len() {
            return Err(AttachmentError::IndexOutOfRange { index, len: self.files.len() });
        }
        Ok(self.files.remove(index))
    }

    /// Drain every pending file, leaving the collector empty.
    pub fn take(&mut self) -> Vec<PendingFile> {
        std::mem::take(&mut self.files)
    }

    /// Put drained files back ahead of anything queued since.
    pub fn restore(&mut self, mut files: Vec<PendingFile>) {
        files.append(&mut self.files);
        self.files = files;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn list(&self) -> Vec<PendingFileInfo> {
        self.files
            .iter()
            .enumerate()
            .map(|(index, f)| PendingFileInfo { index, name: f.name.clone(), mime_type: f.mime_type.clone() })
            .collect()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode every file concurrently. Unreadable files are logged and skipped.
pub async fn encode_all(files: &[PendingFile]) -> EncodedBatch {
    let results = join_all(files.iter().map(|file| async move {
        let bytes = file.read().await?;
        Ok::<_, AttachmentError>(Attachment::from_bytes(&bytes, file.mime_type.clone()))
    }))
    .await;

    let mut batch = EncodedBatch::default();
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(attachment) => batch.attachments.push(attachment),
            Err(e) => {
                warn!(error = %e, name = %file.name, "attachment: skipping unreadable file");
                batch.skipped.push(file.name.clone());
            }
        }
    }
    batch
}

#[must_use]
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

/// Best-effort MIME type for a file name, for inputs that carry no type.
#[must_use]
pub fn mime_from_extension(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "attachment_test.rs"]
mod tests;
