use std::sync::Arc;

use super::*;
use crate::services::creation::Creation;
use crate::services::preview::PhaseKind;
use crate::state::test_helpers::{self, MockLlm, MockReply};

fn upload(name: &str, mime: &str) -> PendingFile {
    pending_upload(name.into(), mime.into(), b"bytes".to_vec())
}

#[tokio::test]
async fn state_reports_idle_and_missing_llm() {
    let state = test_helpers::test_app_state();
    let Json(body) = get_state(State(state)).await;
    assert_eq!(body.preview.phase, PhaseKind::Idle);
    assert!(body.attachments.is_empty());
    assert!(!body.llm_configured);
}

#[test]
fn uploads_from_drop_and_paste_must_be_images() {
    let mut collector = AttachmentCollector::new();
    let (accepted, rejected) = queue_uploads(
        &mut collector,
        vec![
            (AttachmentSource::DragDrop, upload("shot.png", "image/png")),
            (AttachmentSource::Paste, upload("snippet.txt", "text/plain")),
            (AttachmentSource::FilePicker, upload("brief.pdf", "application/pdf")),
        ],
    );
    assert_eq!(accepted, 2);
    assert_eq!(rejected, vec!["snippet.txt".to_string()]);
    let names: Vec<_> = collector.list().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["shot.png", "brief.pdf"]);
}

#[tokio::test]
async fn remove_attachment_by_index() {
    let state = test_helpers::test_app_state();
    {
        let mut collector = state.attachments.lock().await;
        collector.add(AttachmentSource::FilePicker, upload("a.png", "image/png"));
        collector.add(AttachmentSource::FilePicker, upload("b.png", "image/png"));
    }

    let Json(left) = remove_attachment(State(state.clone()), Path(0)).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].name, "b.png");

    let err = remove_attachment(State(state), Path(5)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_renders_creation() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("```html\n<!DOCTYPE html><html></html>\n```")));
    let state = test_helpers::test_app_state_with_llm(llm);
    let body = GenerateBody { url: "https://linear.app".into(), instructions: "create an issue".into() };

    let Json(response) = generate(State(state.clone()), Json(body)).await.unwrap();
    assert_eq!(response.creation.name, "Linear.app Demo");
    assert!(response.skipped.is_empty());
    assert_eq!(state.preview.read().await.kind(), PhaseKind::Rendered);
}

#[tokio::test]
async fn generate_with_empty_input_is_bad_request() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm);
    let body = GenerateBody { url: String::new(), instructions: "   ".into() };

    let err = generate(State(state), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_EMPTY_INPUT");
}

#[tokio::test]
async fn generate_without_llm_is_unavailable() {
    let state = test_helpers::test_app_state();
    let body = GenerateBody { url: "https://linear.app".into(), instructions: String::new() };

    let err = generate(State(state), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn generate_while_generating_conflicts() {
    let llm = Arc::new(MockLlm::new(MockReply::Text("<!DOCTYPE html>")));
    let state = test_helpers::test_app_state_with_llm(llm);
    state.preview.write().await.begin_generation().unwrap();
    let body = GenerateBody { url: "https://linear.app".into(), instructions: String::new() };

    let err = generate(State(state), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);
    assert!(err.retryable);
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let llm = Arc::new(MockLlm::new(MockReply::Fail(500)));
    let state = test_helpers::test_app_state_with_llm(llm);
    let body = GenerateBody { url: "https://linear.app".into(), instructions: String::new() };

    let err = generate(State(state.clone()), Json(body)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    assert_eq!(state.preview.read().await.kind(), PhaseKind::Idle);
}

#[tokio::test]
async fn split_view_toggles_and_reset_clears() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_creation(
        &state,
        Creation::new("Demo", "<html></html>", Some("data:image/png;base64,AA==".into())),
    )
    .await;

    let Json(first) = toggle_split_view(State(state.clone())).await.unwrap();
    assert!(!first.split_view);
    let Json(second) = toggle_split_view(State(state.clone())).await.unwrap();
    assert!(second.split_view);

    assert_eq!(reset(State(state.clone())).await, StatusCode::NO_CONTENT);
    let err = toggle_split_view(State(state)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}
