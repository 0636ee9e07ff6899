mod common;

use chrono::{Duration, Utc};
use common::*;
use tempfile::TempDir;
use xhs_autopilot::collect::collect_all;
use xhs_autopilot::history::History;
use xhs_autopilot::pipeline::Pipeline;
use xhs_autopilot::sources::PullArticles;
use xhs_autopilot::types::{PublishStatus, Result, RunOutcome};

#[tokio::test]
async fn duplicate_urls_across_sources_collapse() -> Result<()> {
    let _ = tracing_subscriber::fmt().try_init();
    let dir = TempDir::new()?;
    let history = History::new(dir.path().join("history.json"));

    let shared = article("dup001", "Same story");
    let sources: Vec<Box<dyn PullArticles>> = vec![
        StubSource::with_articles(vec![shared.clone(), article("one001", "First")]),
        StubSource::with_articles(vec![shared, article("two002", "Second")]),
    ];

    let candidates = collect_all(&sources, &history, 48, 15).await?;
    assert_eq!(candidates.len(), 3);
    assert_eq!(
        candidates.iter().filter(|a| a.id == "dup001").count(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn stale_articles_are_dropped() -> Result<()> {
    let _ = tracing_subscriber::fmt().try_init();
    let dir = TempDir::new()?;
    let history = History::new(dir.path().join("history.json"));

    let mut old = article("old001", "Last week's story");
    old.published_at = Utc::now() - Duration::hours(72);
    let sources: Vec<Box<dyn PullArticles>> =
        vec![StubSource::with_articles(vec![old, article("new001", "Fresh")])];

    let candidates = collect_all(&sources, &history, 48, 15).await?;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, "new001");
    Ok(())
}

#[tokio::test]
async fn failing_source_is_skipped_not_fatal() -> Result<()> {
    let _ = tracing_subscriber::fmt().try_init();
    let dir = TempDir::new()?;
    let history = History::new(dir.path().join("history.json"));

    let sources: Vec<Box<dyn PullArticles>> = vec![
        StubSource::failing("connection refused"),
        StubSource::with_articles(vec![article("ok0001", "Reachable")]),
    ];

    let candidates = collect_all(&sources, &history, 48, 15).await?;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, "ok0001");
    Ok(())
}

#[tokio::test]
async fn candidates_are_newest_first_and_capped() -> Result<()> {
    let _ = tracing_subscriber::fmt().try_init();
    let dir = TempDir::new()?;
    let history = History::new(dir.path().join("history.json"));

    let mut articles = Vec::new();
    for i in 0..10 {
        let mut a = article(&format!("art{:03}", i), &format!("Story {}", i));
        a.published_at = Utc::now() - Duration::minutes(i);
        articles.push(a);
    }
    let sources: Vec<Box<dyn PullArticles>> = vec![StubSource::with_articles(articles)];

    let candidates = collect_all(&sources, &history, 48, 5).await?;
    assert_eq!(candidates.len(), 5);
    assert_eq!(candidates[0].id, "art000");
    assert!(candidates
        .windows(2)
        .all(|w| w[0].published_at >= w[1].published_at));
    Ok(())
}

#[tokio::test]
async fn already_published_articles_never_come_back() -> Result<()> {
    let _ = tracing_subscriber::fmt().try_init();
    let dir = TempDir::new()?;
    let history_path = dir.path().join("history.json");

    // First run publishes the only article.
    let mut config = xhs_autopilot::Config::default();
    config.output.dir = dir.path().join("output");
    config.output.history_file = history_path.clone();

    let provider = ScriptedProvider::new(vec![
        Ok(selection_json(0)),
        Ok(style_json("warm", "flat")),
        Ok(copy_json()),
    ]);
    let pipeline = Pipeline::new(
        config,
        profile(),
        provider,
        catalog(),
        vec![StubSource::with_articles(vec![article("uniq01", "Only story")])],
        StubImageGenerator::new(1),
        StubPublisher::new(PublishStatus::Published),
        History::new(history_path.clone()),
    );
    let first = pipeline.run(false, false).await?;
    assert_eq!(first.outcome, RunOutcome::Published);

    // The same candidate is now filtered out at collection time.
    let history = History::new(history_path);
    let sources: Vec<Box<dyn PullArticles>> =
        vec![StubSource::with_articles(vec![article("uniq01", "Only story")])];
    let candidates = collect_all(&sources, &history, 48, 15).await?;
    assert!(candidates.is_empty());
    Ok(())
}
