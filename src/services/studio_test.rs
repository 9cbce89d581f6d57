use std::time::Duration;

use super::*;
use crate::llm::types::Part;
use crate::services::attachment::{AttachmentSource, FileBody, PendingFile};
use crate::services::preview::PhaseKind;
use crate::state::test_helpers::{self, MockLlm, MockReply};

fn png(name: &str, bytes: &[u8]) -> PendingFile {
    PendingFile { name: name.into(), mime_type: "image/png".into(), body: FileBody::Bytes(bytes.to_vec()) }
}

#[tokio::test]
async fn scenario_url_and_instructions_without_images() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("```html\n<!DOCTYPE html><html><body>demo</body></html>\n```")));
    let state = test_helpers::test_app_state_with_llm(llm.clone());

    let outcome = submit(&state, "https://linear.app", "show issue creation").await.unwrap();
    assert!(outcome.creation.html.starts_with("<!DOCTYPE html>"));
    assert!(outcome.creation.original_image.is_none());
    assert_eq!(outcome.creation.name, "Linear.app Demo");

    let snap = state.preview.read().await.snapshot();
    assert_eq!(snap.phase, PhaseKind::Rendered);
    assert!(!snap.split_view);

    let requests = llm.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].parts.len(), 1);
    assert!(matches!(&requests[0].parts[0], Part::Text { text }
        if text.contains("https://linear.app") && text.contains("show issue creation")));
}

#[tokio::test]
async fn scenario_two_images_in_order_and_split_view() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm.clone());
    {
        let mut collector = state.attachments.lock().await;
        collector.add(AttachmentSource::DragDrop, png("first.png", b"first"));
        collector.add(AttachmentSource::Paste, png("second.png", b"second"));
    }

    let outcome = submit(&state, "https://example.com", "tour").await.unwrap();
    assert!(state.attachments.lock().await.is_empty());
    assert!(
        outcome
            .creation
            .original_image
            .as_deref()
            .is_some_and(|url| url.starts_with("data:image/png;base64,"))
    );
    assert!(state.preview.read().await.snapshot().split_view);

    let requests = llm.requests.lock().unwrap();
    let parts = &requests[0].parts;
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[0], Part::Text { text } if text.contains("Reference images attached: 2")));
    assert_eq!(parts[1], Part::inline("image/png", "Zmlyc3Q="));
    assert_eq!(parts[2], Part::inline("image/png", "c2Vjb25k"));
}

#[tokio::test]
async fn scenario_model_failure_returns_to_idle() {
    let llm = Arc::new(MockLlm::new(MockReply::Fail(503)));
    let state = test_helpers::test_app_state_with_llm(llm);

    let err = submit(&state, "https://linear.app", "show issue creation").await.unwrap_err();
    assert_eq!(err.error_code(), "E_API_RESPONSE");

    let preview = state.preview.read().await;
    let snap = preview.snapshot();
    assert_eq!(snap.phase, PhaseKind::Idle);
    assert!(snap.creation.is_none());
    assert!(snap.last_error.is_some());
    assert!(preview.creation().is_err());
}

#[tokio::test]
async fn empty_input_is_rejected_before_any_call() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm.clone());

    let err = submit(&state, "  ", "").await.unwrap_err();
    assert!(matches!(err, StudioError::Generation(GenerationError::EmptyInput)));
    assert!(llm.requests.lock().unwrap().is_empty());
    assert_eq!(state.preview.read().await.kind(), PhaseKind::Idle);
}

#[tokio::test]
async fn missing_llm_is_fatal_for_generation() {
    let state = test_helpers::test_app_state();
    let err = submit(&state, "https://linear.app", "").await.unwrap_err();
    assert_eq!(err.error_code(), "E_LLM_NOT_CONFIGURED");
    assert_eq!(state.preview.read().await.kind(), PhaseKind::Idle);
}

#[tokio::test]
async fn empty_model_text_yields_placeholder_document() {
    let llm = Arc::new(MockLlm::new(MockReply::Empty));
    let state = test_helpers::test_app_state_with_llm(llm);
    let outcome = submit(&state, "https://linear.app", "").await.unwrap();
    assert_eq!(outcome.creation.html, generation::FALLBACK_DOCUMENT);
}

#[tokio::test]
async fn submit_while_generating_is_busy() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm.clone());
    state.preview.write().await.begin_generation().unwrap();

    let err = submit(&state, "https://linear.app", "").await.unwrap_err();
    assert!(matches!(err, StudioError::Preview(PreviewError::Busy)));
    assert!(llm.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_attachment_is_skipped() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm.clone());
    {
        let mut collector = state.attachments.lock().await;
        collector.add(
            AttachmentSource::FilePicker,
            PendingFile::from_path("/nonexistent/screencast-studio/gone.png".into()),
        );
        collector.add(AttachmentSource::FilePicker, png("ok.png", b"ok"));
    }

    let outcome = submit(&state, "https://example.com", "").await.unwrap();
    assert_eq!(outcome.skipped, vec!["gone.png".to_string()]);
    assert_eq!(llm.requests.lock().unwrap()[0].parts.len(), 2);
}

async fn wait_for_phase(state: &AppState, phase: PhaseKind) {
    for _ in 0..100 {
        if state.preview.read().await.kind() == phase {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("preview never reached {phase:?}");
}

#[tokio::test]
async fn dropped_request_still_finishes_generation() {
    let llm = Arc::new(MockLlm::new(MockReply::Delayed(Duration::from_millis(200), "<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm.clone());

    let cut_off = tokio::time::timeout(Duration::from_millis(50), submit(&state, "https://linear.app", "")).await;
    assert!(cut_off.is_err());
    assert_eq!(state.preview.read().await.kind(), PhaseKind::Generating);

    wait_for_phase(&state, PhaseKind::Rendered).await;
    assert_eq!(llm.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn reset_after_dropped_request_allows_a_new_submit() {
    let llm = Arc::new(MockLlm::new(MockReply::Delayed(Duration::from_millis(200), "<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm.clone());

    let cut_off = tokio::time::timeout(Duration::from_millis(50), submit(&state, "https://linear.app", "")).await;
    assert!(cut_off.is_err());
    state.preview.write().await.reset();

    let outcome = submit(&state, "https://example.com", "").await.unwrap();
    assert_eq!(outcome.creation.name, "Example.com Demo");

    // The first model call answers late and must not replace the shown creation.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(llm.requests.lock().unwrap().len(), 2);
    let shown = state.preview.read().await.creation().unwrap();
    assert_eq!(shown.id, outcome.creation.id);
}

#[tokio::test]
async fn refused_submit_keeps_queued_attachments() {
    let state = test_helpers::test_app_state();
    state
        .attachments
        .lock()
        .await
        .add(AttachmentSource::Paste, png("shot.png", b"shot"));

    let err = submit(&state, "", "").await.unwrap_err();
    assert_eq!(err.error_code(), "E_LLM_NOT_CONFIGURED");
    let names: Vec<_> = state.attachments.lock().await.list().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["shot.png".to_string()]);
}

#[tokio::test]
async fn busy_submit_keeps_queued_attachments() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm);
    state.preview.write().await.begin_generation().unwrap();
    state
        .attachments
        .lock()
        .await
        .add(AttachmentSource::DragDrop, png("shot.png", b"shot"));

    let err = submit(&state, "", "").await.unwrap_err();
    assert!(matches!(err, StudioError::Preview(PreviewError::Busy)));
    assert_eq!(state.attachments.lock().await.len(), 1);
}

#[tokio::test]
async fn only_unreadable_attachments_and_no_text_is_empty_input() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm.clone());
    state.attachments.lock().await.add(
        AttachmentSource::FilePicker,
        PendingFile::from_path("/nonexistent/screencast-studio/gone.png".into()),
    );

    let err = submit(&state, "", " ").await.unwrap_err();
    assert!(matches!(err, StudioError::Generation(GenerationError::EmptyInput)));
    assert!(llm.requests.lock().unwrap().is_empty());
    assert_eq!(state.preview.read().await.kind(), PhaseKind::Idle);
}
