//! Generation client — one round trip to the model, fences stripped.
//!
//! DESIGN
//! ======
//! `generate` holds no state and can be called concurrently. It issues
//! exactly one request with no retry and returns either the cleaned document
//! or an error. No partial output is ever returned on failure; serialising
//! calls is the caller's job.

use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::llm::LlmGenerate;
use crate::llm::types::LlmError;
use crate::services::attachment::Attachment;
use crate::services::prompt::build_request;

/// Substituted when the model answers without any text.
pub const FALLBACK_DOCUMENT: &str = "<!-- Failed to generate content -->";

const FENCE: &str = "```";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("LLM not configured")]
    LlmNotConfigured,
    #[error("a URL, instructions or at least one image is required")]
    EmptyInput,
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl ErrorCode for GenerationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LlmNotConfigured => "E_LLM_NOT_CONFIGURED",
            Self::EmptyInput => "E_EMPTY_INPUT",
            Self::Llm(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Llm(e) if e.retryable())
    }
}

/// Reject input with nothing to work from. Whitespace-only text counts as empty.
///
/// # Errors
///
/// Returns [`GenerationError::EmptyInput`] when URL, instructions and
/// attachments are all empty.
pub fn validate_input(url: &str, instructions: &str, attachment_count: usize) -> Result<(), GenerationError> {
    if url.trim().is_empty() && instructions.trim().is_empty() && attachment_count == 0 {
        return Err(GenerationError::EmptyInput);
    }
    Ok(())
}

/// Generate a demo document for `url` following `instructions`.
///
/// # Errors
///
/// Propagates any [`LlmError`] from the model call.
pub async fn generate(
    llm: &dyn LlmGenerate,
    url: &str,
    instructions: &str,
    images: &[Attachment],
) -> Result<String, GenerationError> {
    let request = build_request(url, instructions, images);
    info!(model = llm.model(), %url, image_count = images.len(), "generation: request sent");

    let response = llm.generate(&request).await?;

    let Some(text) = response.text else {
        warn!(finish_reason = ?response.finish_reason, "generation: response carried no text");
        return Ok(FALLBACK_DOCUMENT.to_string());
    };

    let html = strip_code_fences(&text);
    info!(
        html_len = html.len(),
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "generation: document received"
    );
    Ok(html)
}

// =============================================================================
// FENCE STRIPPING
// =============================================================================

/// Remove Markdown code fences wrapping the whole response.
///
/// Only a fence at the very start (with an optional info string such as
/// `html`) and a fence at the very end are removed; fences inside the
/// document are left alone. Text without a wrapping fence is returned as is.
#[must_use]
pub fn strip_code_fences(raw: &str) -> String {
    let Some(mut current) = strip_once(raw) else {
        return raw.to_string();
    };
    while let Some(next) = strip_once(current) {
        current = next;
    }
    current.to_string()
}

fn strip_once(text: &str) -> Option<&str> {
    let mut body = text.trim();
    let mut changed = false;

    if let Some(rest) = body.strip_prefix(FENCE) {
        body = match rest.split_once('\n') {
            Some((info, after)) if is_info_string(info) => after,
            None if is_info_string(rest) => "",
            _ => strip_html_tag(rest),
        };
        changed = true;
    }

    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
        changed = true;
    }

    changed.then(|| body.trim())
}

/// An `html` info string glued to the markup, as in "```html<!DOCTYPE html>".
fn strip_html_tag(text: &str) -> &str {
    match text.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("html") && text[4..].trim_start().starts_with('<') => {
            text[4..].trim_start()
        }
        _ => text,
    }
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
}

#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;
