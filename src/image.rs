use crate::config::ImageGenConfig;
use crate::styles::ImageStyle;
use crate::types::{FilterResult, GeneratedImage, PipelineError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Produces the note's images for a filter result and style, writing PNG
/// files under `out_dir`.
#[async_trait]
pub trait GenerateImages: Send + Sync {
    async fn generate(
        &self,
        filter: &FilterResult,
        style: &ImageStyle,
        out_dir: &Path,
    ) -> Result<Vec<GeneratedImage>>;
}

/// Volcengine Ark images endpoint (Doubao Seedream models).
pub struct ArkImageGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    number_of_images: usize,
    image_size: String,
    url: String,
}

impl ArkImageGenerator {
    pub fn new(cfg: &ImageGenConfig) -> Result<Self> {
        let base = cfg.base_url.trim_end_matches('/');
        let url = if base.ends_with("/images/generations") {
            base.to_string()
        } else {
            format!("{}/images/generations", base)
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            number_of_images: cfg.number_of_images,
            image_size: cfg.image_size.clone(),
            url,
        })
    }

    async fn generate_single(&self, prompt: &str) -> Result<Vec<u8>> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "size": self.image_size,
            "response_format": "b64_json",
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("image request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Provider(format!(
                "image generation HTTP {}: {}",
                status, text
            )));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Provider(format!("invalid image response: {}", e)))?;

        if let Some(b64) = data["data"][0]["b64_json"].as_str() {
            return BASE64
                .decode(b64)
                .map_err(|e| PipelineError::Provider(format!("bad base64 image data: {}", e)));
        }
        // Some deployments ignore response_format and return a URL instead.
        if let Some(image_url) = data["data"][0]["url"].as_str() {
            let bytes = self
                .client
                .get(image_url)
                .send()
                .await
                .map_err(|e| PipelineError::Provider(format!("image download failed: {}", e)))?
                .error_for_status()
                .map_err(|e| PipelineError::Provider(format!("image download failed: {}", e)))?
                .bytes()
                .await
                .map_err(|e| PipelineError::Provider(format!("image download failed: {}", e)))?;
            return Ok(bytes.to_vec());
        }
        Err(PipelineError::Provider(format!(
            "no image payload in response: {}",
            data
        )))
    }
}

#[async_trait]
impl GenerateImages for ArkImageGenerator {
    async fn generate(
        &self,
        filter: &FilterResult,
        style: &ImageStyle,
        out_dir: &Path,
    ) -> Result<Vec<GeneratedImage>> {
        std::fs::create_dir_all(out_dir)?;
        let prompt = style
            .prompt
            .replace("{subject}", &filter.image_subject)
            .trim()
            .to_string();

        let mut images = Vec::new();
        for i in 0..self.number_of_images {
            let bytes = match self.generate_single(&prompt).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("image {} of {} failed: {}", i + 1, self.number_of_images, e);
                    continue;
                }
            };
            let filename = format!(
                "image_{:02}_{}.png",
                i + 1,
                &Uuid::new_v4().simple().to_string()[..8]
            );
            let path = out_dir.join(filename);
            std::fs::write(&path, &bytes)?;
            // Zero-byte files trip up the publisher later, drop them now.
            if std::fs::metadata(&path)?.len() == 0 {
                warn!("image {} came back empty, discarding", path.display());
                continue;
            }
            images.push(GeneratedImage {
                path,
                prompt_used: prompt.clone(),
            });
        }

        if images.is_empty() {
            return Err(PipelineError::Provider(
                "all image generations failed".to_string(),
            ));
        }
        info!("generated {} images in {}", images.len(), out_dir.display());
        Ok(images)
    }
}
