//! Creation record — the immutable result of one successful generation.
//!
//! A `Creation` is shared as `Arc<Creation>` between the preview state and
//! export handlers. It is never mutated; a new generation or a reset replaces
//! it wholesale.

use std::time::SystemTime;

use reqwest::Url;
use serde::Serialize;
use uuid::Uuid;

use crate::services::prompt::PROMPT_DATA_TAG_ID;

const UNTITLED: &str = "Untitled Demo";
const MAX_INSTRUCTION_WORDS: usize = 6;

#[derive(Debug, Clone)]
pub struct Creation {
    pub id: Uuid,
    pub name: String,
    /// Full generated document, already de-fenced.
    pub html: String,
    /// `data:` URL of the first reference image, for split view.
    pub original_image: Option<String>,
    pub created_at: SystemTime,
}

/// Metadata view of a creation, without the document body.
#[derive(Debug, Clone, Serialize)]
pub struct CreationSummary {
    pub id: Uuid,
    pub name: String,
    pub html_len: usize,
    pub has_original_image: bool,
    pub original_image: Option<String>,
}

impl Creation {
    #[must_use]
    pub fn new(name: impl Into<String>, html: impl Into<String>, original_image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            html: html.into(),
            original_image,
            created_at: SystemTime::now(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> CreationSummary {
        CreationSummary {
            id: self.id,
            name: self.name.clone(),
            html_len: self.html.len(),
            has_original_image: self.original_image.is_some(),
            original_image: self.original_image.clone(),
        }
    }

    /// `<sanitized-name>.html`
    #[must_use]
    pub fn document_filename(&self) -> String {
        format!("{}.html", sanitize_filename(&self.name))
    }

    /// `<sanitized-name>_demo.webm`
    #[must_use]
    pub fn video_filename(&self) -> String {
        format!("{}_demo.webm", sanitize_filename(&self.name))
    }

    /// Narration script embedded by the model, if it included one.
    #[must_use]
    pub fn embedded_prompt(&self) -> Option<&str> {
        extract_embedded_prompt(&self.html)
    }

    /// Text offered by "copy prompt": the embedded script or a generic sentence.
    #[must_use]
    pub fn prompt_text(&self) -> String {
        match self.embedded_prompt() {
            Some(text) => text.to_string(),
            None => format!(
                "Create a narrated, self-playing product demo screencast of {} as a single animated HTML page.",
                self.name
            ),
        }
    }
}

// =============================================================================
// NAMING
// =============================================================================

/// Derive a display name from the inputs.
///
/// Uses the URL host (without `www.`) when the URL parses, then the first few
/// words of the instructions, then a fixed fallback.
#[must_use]
pub fn derive_name(url: &str, instructions: &str) -> String {
    if let Some(host) = url_host(url) {
        return format!("{host} Demo");
    }

    let words: Vec<&str> = instructions
        .split_whitespace()
        .take(MAX_INSTRUCTION_WORDS)
        .collect();
    if words.is_empty() {
        return UNTITLED.to_string();
    }
    let name = words.join(" ");
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

fn url_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = Url::parse(raw).or_else(|_| Url::parse(&format!("https://{raw}"))).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    let mut chars = host.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Turn a display name into a file stem.
///
/// Whitespace runs become a single `_`, every other non-alphanumeric
/// character is dropped, and the result is lower-cased. An empty result
/// falls back to `creation`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_whitespace() {
            pending_sep = !out.is_empty();
        } else if c.is_ascii_alphanumeric() {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.push(c.to_ascii_lowercase());
        }
    }
    if out.is_empty() { "creation".to_string() } else { out }
}

// =============================================================================
// EMBEDDED PROMPT
// =============================================================================

/// Extract the body of `<script id="design-prompt-data" type="text/plain">`.
#[must_use]
pub fn extract_embedded_prompt(html: &str) -> Option<&str> {
    let open = format!(r#"<script id="{PROMPT_DATA_TAG_ID}" type="text/plain">"#);
    let start = html.find(&open)? + open.len();
    let end = html[start..].find("</script>")? + start;
    let body = html[start..end].trim();
    if body.is_empty() { None } else { Some(body) }
}

#[cfg(test)]
#[path = "creation_test.rs"]
mod tests;
