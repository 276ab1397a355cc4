//! Chat model clients for the LLM-backed summarization tools.
//!
//! [`LlmClient`] is the seam the tools call through. [`ChatOpenAI`] (feature `openai`) talks to
//! any OpenAI-compatible Chat Completions API; [`MockLlm`] returns a fixed reply for tests.
//! Every LLM tool falls back to its rule-based counterpart when no client is configured or
//! the call fails, so a missing API key never fails a run.

mod mock;

#[cfg(feature = "openai")]
mod openai;

pub use mock::MockLlm;

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Model used when `OPENAI_MODEL` is unset or empty.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(String),

    #[error("llm returned no content")]
    EmptyResponse,
}

/// Single-turn completion: a system instruction plus one user prompt in, assistant text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Connection settings for the chat model, read from `OPENAI_API_KEY`, `OPENAI_BASE_URL`
/// (or `OPENAI_API_BASE`) and `OPENAI_MODEL`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_empty("OPENAI_API_KEY"),
            base_url: non_empty("OPENAI_BASE_URL")
                .or_else(|| non_empty("OPENAI_API_BASE"))
                .map(|b| b.trim_end_matches('/').to_string()),
            model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Client for this config; `None` without an API key or without the `openai` feature.
    pub fn build(&self) -> Option<Arc<dyn LlmClient>> {
        let api_key = self.api_key.as_deref()?;
        build_client(api_key, self.base_url.as_deref(), &self.model)
    }
}

/// Client configured from the environment, if any.
pub fn llm_from_env() -> Option<Arc<dyn LlmClient>> {
    LlmConfig::from_env().build()
}

#[cfg(feature = "openai")]
fn build_client(api_key: &str, base_url: Option<&str>, model: &str) -> Option<Arc<dyn LlmClient>> {
    use async_openai::config::OpenAIConfig;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = base_url {
        config = config.with_api_base(base);
    }
    Some(Arc::new(ChatOpenAI::with_config(config, model).with_temperature(0.3)))
}

#[cfg(not(feature = "openai"))]
fn build_client(_api_key: &str, _base_url: Option<&str>, _model: &str) -> Option<Arc<dyn LlmClient>> {
    None
}
