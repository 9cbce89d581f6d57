//! Prompt assembly — fixed system instruction plus one per-call user message.
//!
//! The system instruction is the output contract for the model and never
//! varies between calls. The user message carries the literal URL, the
//! literal instructions and the attachment count, followed by one inline
//! part per image in attachment order.

use std::fmt::Write;

use crate::llm::types::{GenerateRequest, Part};
use crate::services::attachment::Attachment;

pub const TEMPERATURE: f32 = 0.7;

/// Id of the plain-text script tag that carries the narration script.
pub const PROMPT_DATA_TAG_ID: &str = "design-prompt-data";

pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert product designer and front-end engineer who produces polished, narrated product demo screencasts.

Your output is ONE self-contained HTML document and nothing else:
- Begin with <!DOCTYPE html>. Do not wrap the document in Markdown code fences and do not add commentary before or after it.
- Inline all CSS and JavaScript. Do not load external scripts, stylesheets or fonts except Google Fonts.
- Render a realistic browser window (title bar, traffic-light buttons, address bar showing the target URL) that fills the viewport.
- Inside the window, recreate the target website's look: layout, colour palette, typography and key UI components. Use any reference images supplied as the source of truth for visual details.
- Play a scripted demo automatically on load with no user interaction: an animated cursor moves between elements, clicks, types into fields and navigates between views with smooth transitions.
- Show captions for each step and narrate them with the Web Speech API (speechSynthesis), keeping captions and voice in sync with the animation timeline.
- The timeline must start from zero every time the document loads so it can be recorded from the beginning.
- Include the full narration script in a <script id="design-prompt-data" type="text/plain"> tag so the host page can copy it.
- Use placeholder data that looks real. Never show lorem ipsum.
- The document runs inside a sandboxed iframe that allows scripts, forms, popups, modals and same-origin access. Do not rely on anything else."#;

/// Build the per-call text part.
#[must_use]
pub fn build_user_text(url: &str, instructions: &str, image_count: usize) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Target website URL: {url}");
    let _ = writeln!(text, "Demo instructions: {instructions}");
    let _ = writeln!(text, "Reference images attached: {image_count}");
    text.push('\n');
    text.push_str("Task:\n");
    text.push_str("1. Recreate the website at the URL above inside a simulated browser window.\n");
    if image_count > 0 {
        text.push_str("2. Match the attached reference images as closely as possible.\n");
    } else {
        text.push_str("2. Infer the site's visual design from what you know about the URL.\n");
    }
    text.push_str("3. Animate a narrated walkthrough that follows the demo instructions step by step.\n");
    text.push_str("4. Return only the complete HTML document.");
    text
}

/// Assemble the full request: one text part, then one inline part per image.
#[must_use]
pub fn build_request(url: &str, instructions: &str, images: &[Attachment]) -> GenerateRequest {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part::text(build_user_text(url, instructions, images.len())));
    parts.extend(
        images
            .iter()
            .map(|img| Part::inline(img.mime_type.clone(), img.base64.clone())),
    );

    GenerateRequest { system_instruction: SYSTEM_INSTRUCTION.to_string(), parts, temperature: TEMPERATURE }
}

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;
