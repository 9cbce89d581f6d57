//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It is
//! the single owner of everything the page shows: the pending attachments and
//! the preview lifecycle. The LLM client is optional so the service can start
//! without credentials; generation then fails with a configuration error.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::llm::LlmGenerate;
use crate::services::attachment::AttachmentCollector;
use crate::services::preview::Preview;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    /// Optional LLM client. `None` if the API key is not configured.
    pub llm: Option<Arc<dyn LlmGenerate>>,
    /// Files queued for the next submit.
    pub attachments: Arc<Mutex<AttachmentCollector>>,
    /// Display lifecycle of the current creation.
    pub preview: Arc<RwLock<Preview>>,
}

impl AppState {
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmGenerate>>, loading_step: Duration) -> Self {
        Self {
            llm,
            attachments: Arc::new(Mutex::new(AttachmentCollector::new())),
            preview: Arc::new(RwLock::new(Preview::new(loading_step))),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
