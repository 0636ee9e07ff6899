pub mod news_api;
pub mod rss_feed;

pub use news_api::NewsApiSource;
pub use rss_feed::RssFeedSource;

use crate::types::{Article, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// A source of candidate articles (RSS feed, news API, ...).
#[async_trait]
pub trait PullArticles: Send + Sync {
    /// Human-readable name for logs.
    fn source_name(&self) -> String;

    /// Fetch current candidates. An error here skips the source for this
    /// run; it never aborts collection as a whole.
    async fn pull(&self) -> Result<Vec<Article>>;
}

/// Stable article id derived from the URL. The URL is the dedup key within a
/// run, so two sources reporting the same link collapse to one candidate.
pub fn article_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest
        .iter()
        .take(6)
        .map(|byte| format!("{:02x}", byte))
        .collect()
}
