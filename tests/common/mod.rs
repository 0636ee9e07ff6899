#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use xhs_autopilot::config::AccountProfile;
use xhs_autopilot::image::GenerateImages;
use xhs_autopilot::providers::AiProvider;
use xhs_autopilot::publish::PublishNote;
use xhs_autopilot::sources::PullArticles;
use xhs_autopilot::styles::{CopyStyle, FilterPrompt, ImageStyle, StyleCatalog};
use xhs_autopilot::types::{
    Article, ArticleSource, FilterResult, GeneratedImage, PipelineError, PublishResult,
    PublishStatus, Result, XhsCopywrite,
};

/// Replays canned completions in call order. `Err` entries surface as
/// provider errors.
pub struct ScriptedProvider {
    responses: Mutex<Vec<std::result::Result<String, String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<std::result::Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str, _system: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(PipelineError::Provider("script exhausted".to_string()));
        }
        responses.remove(0).map_err(PipelineError::Provider)
    }
}

/// Source backed by a fixed article list, or a permanent failure.
pub struct StubSource {
    pub name: String,
    pub articles: std::result::Result<Vec<Article>, String>,
}

impl StubSource {
    pub fn with_articles(articles: Vec<Article>) -> Box<Self> {
        Box::new(Self {
            name: "stub".to_string(),
            articles: Ok(articles),
        })
    }

    pub fn failing(message: &str) -> Box<Self> {
        Box::new(Self {
            name: "broken".to_string(),
            articles: Err(message.to_string()),
        })
    }
}

#[async_trait]
impl PullArticles for StubSource {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    async fn pull(&self) -> Result<Vec<Article>> {
        match &self.articles {
            Ok(articles) => Ok(articles.clone()),
            Err(message) => Err(PipelineError::Collect(message.clone())),
        }
    }
}

/// Writes a small placeholder file per image instead of calling anything.
pub struct StubImageGenerator {
    pub count: usize,
    pub calls: Arc<AtomicUsize>,
}

impl StubImageGenerator {
    pub fn new(count: usize) -> Box<Self> {
        Box::new(Self {
            count,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl GenerateImages for StubImageGenerator {
    async fn generate(
        &self,
        _filter: &FilterResult,
        style: &ImageStyle,
        out_dir: &Path,
    ) -> Result<Vec<GeneratedImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::fs::create_dir_all(out_dir)?;
        let mut images = Vec::new();
        for i in 0..self.count {
            let path = out_dir.join(format!("image_{:02}.png", i + 1));
            std::fs::write(&path, b"fake png")?;
            images.push(GeneratedImage {
                path,
                prompt_used: style.prompt.clone(),
            });
        }
        Ok(images)
    }
}

/// Records invocations and returns a fixed status.
pub struct StubPublisher {
    pub status: PublishStatus,
    pub calls: Arc<AtomicUsize>,
}

impl StubPublisher {
    pub fn new(status: PublishStatus) -> Box<Self> {
        Box::new(Self {
            status,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl PublishNote for StubPublisher {
    async fn publish(
        &self,
        _copy: &XhsCopywrite,
        _images: &[GeneratedImage],
    ) -> Result<PublishResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PublishResult {
            status: self.status,
            note_id: match self.status {
                PublishStatus::Published => Some("note-123".to_string()),
                _ => None,
            },
            error_message: match self.status {
                PublishStatus::Failed => Some("rejected".to_string()),
                _ => None,
            },
            published_at: Utc::now(),
        })
    }
}

pub fn article(id: &str, title: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://example.com/{}", id),
        source: ArticleSource::Rss,
        source_name: "stub".to_string(),
        summary: "summary text".to_string(),
        language: "en".to_string(),
        published_at: Utc::now(),
        collected_at: Utc::now(),
    }
}

pub fn catalog() -> StyleCatalog {
    StyleCatalog {
        filter_prompt: FilterPrompt {
            system_prompt: "pick the best article".to_string(),
            user_prompt: "candidates:\n{articles_text}\nreturn JSON".to_string(),
        },
        copy_styles: vec![
            CopyStyle {
                id: "warm".to_string(),
                name: "暖心分享".to_string(),
                description: "friendly tone".to_string(),
                system_prompt: String::new(),
                user_prompt: "write about {article_title} using:\n{key_points_text}".to_string(),
            },
            CopyStyle {
                id: "urgent".to_string(),
                name: "热点速递".to_string(),
                description: "breaking-news tone".to_string(),
                system_prompt: String::new(),
                user_prompt: "breaking: {article_title}".to_string(),
            },
        ],
        image_styles: vec![
            ImageStyle {
                id: "flat".to_string(),
                name: "扁平插画".to_string(),
                description: "flat illustration".to_string(),
                prompt: "flat illustration of {subject}".to_string(),
            },
            ImageStyle {
                id: "photo".to_string(),
                name: "写实摄影".to_string(),
                description: "photo realistic".to_string(),
                prompt: "photo of {subject}".to_string(),
            },
        ],
        default_copy_style: "warm".to_string(),
        default_image_style: "flat".to_string(),
    }
}

pub fn profile() -> AccountProfile {
    AccountProfile {
        name: "测试账号".to_string(),
        domain: "health news".to_string(),
        persona: "friendly nutrition editor".to_string(),
        target_audience: "young professionals".to_string(),
        tone: "warm".to_string(),
        title_max_length: 20,
        body_max_length: 1000,
        hashtag_count: 5,
        ..AccountProfile::default()
    }
}

pub fn selection_json(index: usize) -> String {
    format!(
        r#"{{"selected_index": {}, "relevance_score": 0.9,
            "key_points": ["point one", "point two"],
            "image_subject": "a bowl of salad",
            "reasoning": "on topic"}}"#,
        index
    )
}

pub fn style_json(copy: &str, image: &str) -> String {
    format!(
        r#"{{"copywrite_style_id": "{}", "image_style_id": "{}", "reasoning": "fits"}}"#,
        copy, image
    )
}

pub fn copy_json() -> String {
    r#"{"title": "今日健康速报", "body": "正文内容在这里。", "hashtags": ["健康", "饮食"]}"#
        .to_string()
}
