use super::{article_id, PullArticles};
use crate::types::{Article, ArticleSource, Result};
use crate::utils::truncate_chars;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";

/// NewsAPI.org `everything` search, one request per configured query.
pub struct NewsApiSource {
    api_key: String,
    queries: Vec<String>,
    max_results: usize,
    max_age_hours: i64,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    source: NewsApiSourceField,
}

#[derive(Deserialize, Default)]
struct NewsApiSourceField {
    #[serde(default)]
    name: Option<String>,
}

impl NewsApiSource {
    pub fn new(api_key: &str, queries: &[String], max_results: usize, max_age_hours: i64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            queries: queries.to_vec(),
            max_results,
            max_age_hours,
            client,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<Article>> {
        let from = (Utc::now() - Duration::hours(self.max_age_hours))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        let page_size = self.max_results.min(100).to_string();
        // NewsAPI indexes Chinese and English sources separately.
        let language = if query.is_ascii() { "en" } else { "zh" };

        let response = self
            .client
            .get(NEWSAPI_URL)
            .query(&[
                ("q", query),
                ("apiKey", self.api_key.as_str()),
                ("from", from.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("language", language),
            ])
            .send()
            .await?
            .error_for_status()?;
        let data: NewsApiResponse = response.json().await?;

        let now = Utc::now();
        let articles = data
            .articles
            .into_iter()
            .map(|a| {
                let summary = a
                    .description
                    .or(a.content)
                    .unwrap_or_default();
                Article {
                    id: article_id(&a.url),
                    title: a.title.unwrap_or_default().trim().to_string(),
                    url: a.url,
                    source: ArticleSource::NewsApi,
                    source_name: a.source.name.unwrap_or_else(|| "newsapi".to_string()),
                    summary: truncate_chars(summary.trim(), 500),
                    language: language.to_string(),
                    published_at: a.published_at.unwrap_or(now),
                    collected_at: now,
                }
            })
            .collect();
        Ok(articles)
    }
}

#[async_trait]
impl PullArticles for NewsApiSource {
    fn source_name(&self) -> String {
        "newsapi".to_string()
    }

    async fn pull(&self) -> Result<Vec<Article>> {
        let mut all = Vec::new();
        for query in &self.queries {
            match self.search(query).await {
                Ok(mut articles) => {
                    debug!("newsapi query {:?} returned {} articles", query, articles.len());
                    all.append(&mut articles);
                }
                Err(e) => warn!("newsapi query {:?} failed: {}", query, e),
            }
        }
        Ok(all)
    }
}
