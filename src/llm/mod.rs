//! LLM — generative model adapter for demo synthesis.
//!
//! DESIGN
//! ======
//! Uses environment variables instead of config files. `LlmClient` wraps the
//! Gemini `generateContent` endpoint and carries the configured model name.
//! Callers depend on the [`LlmGenerate`] trait so tests can swap in mocks.

pub mod config;
pub mod gemini;
pub mod types;

use config::LlmConfig;
pub use types::LlmGenerate;
use types::{GenerateRequest, GenerateResponse, LlmError};

// =============================================================================
// CLIENT
// =============================================================================

/// Concrete LLM client backed by Gemini.
///
/// Configured from environment variables by [`LlmClient::from_env`].
pub struct LlmClient {
    inner: gemini::GeminiClient,
    model: String,
}

impl LlmClient {
    /// Build an LLM client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let inner = gemini::GeminiClient::new(config.api_key, config.base_url, config.timeouts)?;
        Ok(Self { inner, model: config.model })
    }
}

#[async_trait::async_trait]
impl LlmGenerate for LlmClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.inner.generate(&self.model, request).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
