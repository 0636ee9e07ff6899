use super::AiProvider;
use crate::types::{PipelineError, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

const DEFAULT_SYSTEM: &str = "你是一个专业的小红书内容运营编辑。";

/// Anthropic-compatible messages endpoint (MiniMax and similar gateways).
///
/// Auth is an `x-api-key` header. The response carries typed content blocks;
/// thinking blocks are skipped and the first `text` block is the completion.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: super::http_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
            url: format!("{}/v1/messages", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, prompt: &str, system: &str) -> Result<String> {
        if prompt.is_empty() {
            return Err(PipelineError::Provider("prompt must not be empty".to_string()));
        }

        let body = json!({
            "model": self.model,
            "max_tokens": 2048,
            "system": if system.is_empty() { DEFAULT_SYSTEM } else { system },
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!("sending messages request to {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Provider(format!("HTTP {}: {}", status, text)));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Provider(format!("invalid response body: {}", e)))?;

        data["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|block| block["type"] == "text")
                    .and_then(|block| block["text"].as_str())
                    .map(str::to_string)
            })
            .ok_or_else(|| PipelineError::Provider(format!("no text content in response: {}", data)))
    }
}
