use crate::config::StylesConfig;
use crate::providers::AiProvider;
use crate::types::{Article, PipelineError, Result, StyleDecision};
use crate::utils::{extract_json, truncate_chars};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct CopyStyle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageStyle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterPrompt {
    #[serde(default)]
    pub system_prompt: String,
    pub user_prompt: String,
}

/// The configured set of styles plus the default pair. Loaded once at
/// startup and read-only thereafter.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    pub filter_prompt: FilterPrompt,
    pub copy_styles: Vec<CopyStyle>,
    pub image_styles: Vec<ImageStyle>,
    pub default_copy_style: String,
    pub default_image_style: String,
}

#[derive(Deserialize)]
struct StyleFile<T> {
    styles: Vec<T>,
}

impl StyleCatalog {
    pub fn load(cfg: &StylesConfig) -> Result<Self> {
        let filter_prompt: FilterPrompt = read_yaml(&cfg.filter)?;
        let copy: StyleFile<CopyStyle> = read_yaml(&cfg.copywrite)?;
        let image: StyleFile<ImageStyle> = read_yaml(&cfg.image)?;

        let catalog = Self {
            filter_prompt,
            copy_styles: copy.styles,
            image_styles: image.styles,
            default_copy_style: cfg.default_copy_style.clone(),
            default_image_style: cfg.default_image_style.clone(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// A catalog with an unknown default id must refuse to start; the
    /// fallback path depends on the defaults always being valid.
    pub fn validate(&self) -> Result<()> {
        if self.copy_styles.is_empty() || self.image_styles.is_empty() {
            return Err(PipelineError::Config(
                "style catalogs must not be empty".to_string(),
            ));
        }
        if self.copy_style(&self.default_copy_style).is_none() {
            return Err(PipelineError::Config(format!(
                "default copy style {:?} not in catalog",
                self.default_copy_style
            )));
        }
        if self.image_style(&self.default_image_style).is_none() {
            return Err(PipelineError::Config(format!(
                "default image style {:?} not in catalog",
                self.default_image_style
            )));
        }
        Ok(())
    }

    pub fn copy_style(&self, id: &str) -> Option<&CopyStyle> {
        self.copy_styles.iter().find(|s| s.id == id)
    }

    pub fn image_style(&self, id: &str) -> Option<&ImageStyle> {
        self.image_styles.iter().find(|s| s.id == id)
    }

    pub fn default_decision(&self) -> StyleDecision {
        StyleDecision {
            copy_style_id: self.default_copy_style.clone(),
            image_style_id: self.default_image_style.clone(),
        }
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&raw)
        .map_err(|e| PipelineError::Config(format!("invalid YAML in {}: {}", path.display(), e)))
}

/// Decides, per article, which copy and image style to use by asking the
/// provider to pick from the catalog.
pub struct StyleManager {
    catalog: StyleCatalog,
    provider: Arc<dyn AiProvider>,
}

impl StyleManager {
    pub fn new(catalog: StyleCatalog, provider: Arc<dyn AiProvider>) -> Self {
        Self { catalog, provider }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    /// Pick a style pair for the article. Any failure along the way
    /// (provider outage, unparseable answer, unknown id) falls back to the
    /// configured defaults; style selection never aborts a run.
    pub async fn decide(&self, article: &Article) -> StyleDecision {
        match self.ask_provider(article).await {
            Ok(decision) => {
                debug!(
                    "style decision: copy={} image={}",
                    decision.copy_style_id, decision.image_style_id
                );
                decision
            }
            Err(e) => {
                warn!("style decision fell back to defaults: {}", e);
                self.catalog.default_decision()
            }
        }
    }

    async fn ask_provider(&self, article: &Article) -> Result<StyleDecision> {
        let prompt = self.build_prompt(article);
        let response = self.provider.generate(&prompt, "").await?;
        let value = extract_json(&response)?;

        let copy_id = value["copywrite_style_id"].as_str().unwrap_or_default();
        let image_id = value["image_style_id"].as_str().unwrap_or_default();

        if self.catalog.copy_style(copy_id).is_none() {
            return Err(PipelineError::Parse(format!(
                "unknown copy style id {:?}",
                copy_id
            )));
        }
        if self.catalog.image_style(image_id).is_none() {
            return Err(PipelineError::Parse(format!(
                "unknown image style id {:?}",
                image_id
            )));
        }

        Ok(StyleDecision {
            copy_style_id: copy_id.to_string(),
            image_style_id: image_id.to_string(),
        })
    }

    fn build_prompt(&self, article: &Article) -> String {
        let copy_options = self
            .catalog
            .copy_styles
            .iter()
            .map(|s| format!("- {} ({}): {}", s.id, s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n");
        let image_options = self
            .catalog
            .image_styles
            .iter()
            .map(|s| format!("- {} ({}): {}", s.id, s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "你是一个资深的内容主编。请根据以下文章摘要，为这篇小红书笔记选择最合适的文案风格和配图风格。\n\n\
             文章标题: {title}\n文章摘要: {summary}\n\n\
             可选文案风格:\n{copy_options}\n\n\
             可选配图风格:\n{image_options}\n\n\
             返回 JSON 格式：\n\
             {{\"copywrite_style_id\": \"xxx\", \"image_style_id\": \"xxx\", \"reasoning\": \"...\"}}",
            title = article.title,
            summary = truncate_chars(&article.summary, 500),
        )
    }
}
