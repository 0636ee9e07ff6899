use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSource {
    Rss,
    NewsApi,
}

/// A collected candidate article. The id is derived from the URL, which is
/// the stable dedup key within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: ArticleSource,
    pub source_name: String,
    pub summary: String,
    pub language: String,
    pub published_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
}

/// Output of AI selection: one winning article plus the material the
/// downstream generators work from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResult {
    pub selected_article: Article,
    pub relevance_score: f64,
    pub key_points: Vec<String>,
    pub image_subject: String,
    pub reasoning: String,
}

/// The chosen copy/image style pair. Both ids are guaranteed to exist in the
/// loaded style catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDecision {
    pub copy_style_id: String,
    pub image_style_id: String,
}

/// Generated note text. Title and body are already truncated to the
/// account profile's limits; oversized model output never gets this far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XhsCopywrite {
    pub title: String,
    pub body: String,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub prompt_used: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Published,
    Failed,
    DryRun,
}

/// Terminal outcome of the publish stage. Never retried in place; a retry is
/// a new pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub status: PublishStatus,
    pub note_id: Option<String>,
    pub error_message: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Published,
    DryRun,
    Failed,
    NoContent,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RunOutcome::Published => "published",
            RunOutcome::DryRun => "dry_run",
            RunOutcome::Failed => "failed",
            RunOutcome::NoContent => "no_content",
        })
    }
}

/// Everything one run produced. This is the unit persisted to history and
/// serialized under the run's output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: String,
    pub articles_collected: usize,
    pub filter_result: Option<FilterResult>,
    pub style: Option<StyleDecision>,
    pub copywrite: Option<XhsCopywrite>,
    pub images: Vec<GeneratedImage>,
    pub publish_result: Option<PublishResult>,
    pub outcome: RunOutcome,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("could not extract structured output: {0}")]
    Parse(String),

    #[error("collector error: {0}")]
    Collect(String),

    #[error("no article passed selection")]
    SelectionEmpty,

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
