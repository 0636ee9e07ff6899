use super::AiProvider;
use crate::types::{PipelineError, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Generic chat-completions endpoint (DeepSeek, OpenAI, most proxies).
///
/// Auth is a bearer token; the system context travels as a leading `system`
/// role message.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let url = if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/v1/chat/completions", base)
        };
        Ok(Self {
            client: super::http_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
            url,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str, system: &str) -> Result<String> {
        if prompt.is_empty() {
            return Err(PipelineError::Provider("prompt must not be empty".to_string()));
        }

        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let body = json!({
            "model": self.model,
            "messages": messages,
        });

        debug!("sending chat-completion request to {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
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

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PipelineError::Provider(format!("no completion in response: {}", data)))
    }
}
