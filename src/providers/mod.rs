pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use crate::config::{ApiType, ProviderConfig};
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One capability, many backends: produce a text completion for a prompt and
/// an optional system context.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Generate a completion. `prompt` must be non-empty; `system` may be
    /// empty, in which case the backend's default context applies. Fails with
    /// `PipelineError::Provider` on transport, auth or timeout problems.
    /// Never retries internally; retry policy belongs to the caller.
    async fn generate(&self, prompt: &str, system: &str) -> Result<String>;
}

/// Build the backend the configuration names. Selection happens here, once;
/// callers only ever see the trait.
pub fn build_provider(cfg: &ProviderConfig) -> Result<Arc<dyn AiProvider>> {
    let provider: Arc<dyn AiProvider> = match cfg.api_type {
        ApiType::Anthropic => {
            Arc::new(AnthropicProvider::new(&cfg.api_key, &cfg.model, &cfg.base_url)?)
        }
        ApiType::Openai => Arc::new(OpenAiProvider::new(&cfg.api_key, &cfg.model, &cfg.base_url)?),
    };
    Ok(provider)
}

pub(crate) fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}
