use crate::history::History;
use crate::sources::PullArticles;
use crate::types::{Article, Result};
use chrono::{Duration, Utc};
use std::collections::HashSet;
use tracing::{info, warn};

/// Pull from every source, drop stale and already-published articles,
/// dedup by id, newest first, capped at `max_candidates`.
///
/// A failing source is logged and skipped; only the final empty set is the
/// caller's problem.
pub async fn collect_all(
    sources: &[Box<dyn PullArticles>],
    history: &History,
    max_age_hours: i64,
    max_candidates: usize,
) -> Result<Vec<Article>> {
    let published = history.published_article_ids();
    let cutoff = Utc::now() - Duration::hours(max_age_hours);

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();
    for source in sources {
        let articles = match source.pull().await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("source {} failed, skipping: {}", source.source_name(), e);
                continue;
            }
        };
        for article in articles {
            if article.published_at < cutoff {
                continue;
            }
            if published.contains(&article.id) {
                continue;
            }
            if !seen.insert(article.id.clone()) {
                continue;
            }
            candidates.push(article);
        }
    }

    candidates.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    candidates.truncate(max_candidates);

    info!(
        "collected {} candidates from {} sources",
        candidates.len(),
        sources.len()
    );
    Ok(candidates)
}
