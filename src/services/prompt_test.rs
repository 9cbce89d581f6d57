use super::*;

#[test]
fn user_text_embeds_literal_inputs() {
    let text = build_user_text("https://linear.app", "show issue creation", 0);
    assert!(text.contains("Target website URL: https://linear.app"));
    assert!(text.contains("Demo instructions: show issue creation"));
    assert!(text.contains("Reference images attached: 0"));
}

#[test]
fn user_text_mentions_references_only_when_attached() {
    assert!(!build_user_text("u", "i", 0).contains("attached reference images"));
    assert!(build_user_text("u", "i", 2).contains("attached reference images"));
}

#[test]
fn request_without_images_has_single_text_part() {
    let request = build_request("https://linear.app", "show issue creation", &[]);
    assert_eq!(request.parts.len(), 1);
    assert!(matches!(&request.parts[0], Part::Text { text } if text.contains("https://linear.app")));
    assert_eq!(request.system_instruction, SYSTEM_INSTRUCTION);
    assert!((request.temperature - 0.7).abs() < f32::EPSILON);
}

#[test]
fn request_with_two_images_keeps_attachment_order() {
    let images = vec![Attachment::from_bytes(b"first", "image/png"), Attachment::from_bytes(b"second", "image/jpeg")];
    let request = build_request("https://example.com", "", &images);

    assert_eq!(request.parts.len(), 3);
    assert!(matches!(&request.parts[0], Part::Text { text } if text.contains("Reference images attached: 2")));
    assert_eq!(request.parts[1], Part::inline("image/png", images[0].base64.clone()));
    assert_eq!(request.parts[2], Part::inline("image/jpeg", images[1].base64.clone()));
}

#[test]
fn system_instruction_is_call_independent() {
    let a = build_request("https://a.test", "one", &[]);
    let b = build_request("https://b.test", "two", &[Attachment::from_bytes(b"x", "image/png")]);
    assert_eq!(a.system_instruction, b.system_instruction);
}

#[test]
fn system_instruction_names_embedded_prompt_tag() {
    assert!(SYSTEM_INSTRUCTION.contains(PROMPT_DATA_TAG_ID));
    assert!(SYSTEM_INSTRUCTION.contains("<!DOCTYPE html>"));
}
