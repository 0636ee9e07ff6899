use crate::types::{
    GeneratedImage, PipelineError, PublishResult, PublishStatus, Result, XhsCopywrite,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Pushes a finished note somewhere. The pipeline treats a remote rejection
/// as a failed result, not an error; only transport-level surprises bubble
/// up as `Err`.
#[async_trait]
pub trait PublishNote: Send + Sync {
    async fn publish(
        &self,
        copy: &XhsCopywrite,
        images: &[GeneratedImage],
    ) -> Result<PublishResult>;
}

/// Client for the xiaohongshu-mcp server, speaking JSON-RPC over streamable
/// HTTP. Each tool call opens a fresh session; the server keys sessions on
/// the `mcp-session-id` header it hands back from `initialize`.
pub struct McpPublisher {
    client: reqwest::Client,
    url: String,
}

impl McpPublisher {
    pub fn new(server_url: &str) -> Result<Self> {
        let base = server_url.trim_end_matches('/');
        let base = base.strip_suffix("/mcp").unwrap_or(base);
        // Uploading several multi-MB images over a slow link takes a while.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/mcp", base),
        })
    }

    async fn create_session(&self) -> Result<String> {
        let init = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "xhs-autopilot",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            },
        });
        let response = self.post(&init, None).await?;
        let session_id = response
            .headers()
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::Publish("server did not return a session id".to_string())
            })?;
        // Drain the body so the session is fully established server-side.
        let _ = response.text().await;

        let initialized = json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
        });
        let _ = self.post(&initialized, Some(&session_id)).await?;

        debug!("mcp session {} established", session_id);
        Ok(session_id)
    }

    async fn post(&self, body: &Value, session_id: Option<&str>) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Accept", "application/json, text/event-stream")
            .json(body);
        if let Some(id) = session_id {
            request = request.header("mcp-session-id", id);
        }
        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Publish(format!("mcp request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(PipelineError::Publish(format!(
                "mcp server returned HTTP {}",
                response.status()
            )));
        }
        Ok(response)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let session_id = self.create_session().await?;
        let call = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {
                "name": name,
                "arguments": arguments,
            },
        });
        let response = self.post(&call, Some(&session_id)).await?;
        let text = response
            .text()
            .await
            .map_err(|e| PipelineError::Publish(format!("mcp response unreadable: {}", e)))?;
        let value = parse_rpc_body(&text)?;

        if let Some(error) = value.get("error") {
            return Err(PipelineError::Publish(format!("tool {} failed: {}", name, error)));
        }
        Ok(value["result"].clone())
    }

    /// Whether the server holds a live Xiaohongshu login. Any transport
    /// problem reads as "not logged in".
    pub async fn check_login(&self) -> bool {
        match self.call_tool("check_login_status", json!({})).await {
            Ok(result) => {
                let text = result["content"][0]["text"].as_str().unwrap_or_default();
                text.contains("已登录") || text.to_lowercase().contains("logged in")
            }
            Err(e) => {
                warn!("login check failed: {}", e);
                false
            }
        }
    }
}

/// The note body as the platform sees it: copy text, blank line, hashtags
/// inline as `#tag` tokens.
pub fn compose_content(copy: &XhsCopywrite) -> String {
    if copy.hashtags.is_empty() {
        return copy.body.clone();
    }
    let tags = copy
        .hashtags
        .iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}\n\n{}", copy.body, tags)
}

/// Streamable-HTTP responses may arrive as a plain JSON body or as an SSE
/// stream whose `data:` lines carry the JSON.
fn parse_rpc_body(text: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    for line in text.lines() {
        if let Some(data) = line.strip_prefix("data:") {
            if let Ok(value) = serde_json::from_str(data.trim()) {
                return Ok(value);
            }
        }
    }
    Err(PipelineError::Publish(format!(
        "cannot parse mcp response: {}",
        text
    )))
}

#[async_trait]
impl PublishNote for McpPublisher {
    async fn publish(
        &self,
        copy: &XhsCopywrite,
        images: &[GeneratedImage],
    ) -> Result<PublishResult> {
        for image in images {
            if !image.path.is_file() {
                return Err(PipelineError::Publish(format!(
                    "image file missing: {}",
                    image.path.display()
                )));
            }
        }

        if !self.check_login().await {
            warn!("publish aborted, mcp server has no active login");
            return Ok(PublishResult {
                status: PublishStatus::Failed,
                note_id: None,
                error_message: Some("xiaohongshu login required on the mcp server".to_string()),
                published_at: Utc::now(),
            });
        }

        let image_paths: Vec<String> = images
            .iter()
            .map(|i| i.path.display().to_string())
            .collect();
        let arguments = json!({
            "title": copy.title,
            "content": compose_content(copy),
            "images": image_paths,
            "tags": copy.hashtags,
        });

        match self.call_tool("publish_content", arguments).await {
            Ok(result) => {
                let note_id = result["content"][0]["text"]
                    .as_str()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                info!("published note {:?}", note_id);
                Ok(PublishResult {
                    status: PublishStatus::Published,
                    note_id,
                    error_message: None,
                    published_at: Utc::now(),
                })
            }
            Err(e) => {
                warn!("publish failed: {}", e);
                Ok(PublishResult {
                    status: PublishStatus::Failed,
                    note_id: None,
                    error_message: Some(e.to_string()),
                    published_at: Utc::now(),
                })
            }
        }
    }
}
