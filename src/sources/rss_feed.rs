use super::{article_id, PullArticles};
use crate::types::{Article, ArticleSource, PipelineError, Result};
use crate::utils::truncate_chars;
use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

/// One RSS/Atom feed.
pub struct RssFeedSource {
    name: String,
    url: String,
    lang: String,
    client: reqwest::Client,
}

impl RssFeedSource {
    pub fn new(name: &str, feed_url: &str, lang: &str) -> Result<Self> {
        url::Url::parse(feed_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            name: name.to_string(),
            url: feed_url.to_string(),
            lang: lang.to_string(),
            client,
        })
    }

    async fn fetch(&self) -> Result<String> {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(30),
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        loop {
            match self.try_fetch().await {
                Ok(body) => return Ok(body),
                Err(e) => match backoff.next_backoff() {
                    Some(delay) => {
                        warn!("fetch {} failed ({}), retrying in {:?}", self.url, e, delay);
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    async fn try_fetch(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::Collect(format!(
                "HTTP {} fetching {}",
                response.status(),
                self.url
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PullArticles for RssFeedSource {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    async fn pull(&self) -> Result<Vec<Article>> {
        let body = self.fetch().await?;
        let feed = feed_rs::parser::parse(body.as_bytes()).map_err(|e| {
            PipelineError::Collect(format!("cannot parse feed {}: {}", self.url, e))
        })?;

        let now = Utc::now();
        let mut articles = Vec::new();
        for entry in feed.entries {
            let url = match entry.links.first() {
                Some(link) => link.href.clone(),
                None => continue,
            };
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(now);

            articles.push(Article {
                id: article_id(&url),
                title,
                url,
                source: ArticleSource::Rss,
                source_name: self.name.clone(),
                summary: truncate_chars(summary.trim(), 500),
                language: self.lang.clone(),
                published_at,
                collected_at: now,
            });
        }

        debug!("pulled {} entries from {}", articles.len(), self.name);
        Ok(articles)
    }
}
