mod common;

use chrono::Utc;
use common::*;
use tempfile::TempDir;
use xhs_autopilot::history::History;
use xhs_autopilot::types::{
    PipelineResult, PublishResult, PublishStatus, Result, RunOutcome,
};

fn filter_for(article_id: &str) -> xhs_autopilot::types::FilterResult {
    xhs_autopilot::types::FilterResult {
        selected_article: article(article_id, "Story"),
        relevance_score: 0.5,
        key_points: Vec::new(),
        image_subject: "subject".to_string(),
        reasoning: String::new(),
    }
}

fn result_for(run_id: &str, outcome: RunOutcome, article_id: &str) -> PipelineResult {
    PipelineResult {
        run_id: run_id.to_string(),
        articles_collected: 1,
        filter_result: Some(filter_for(article_id)),
        style: None,
        copywrite: None,
        images: Vec::new(),
        publish_result: Some(PublishResult {
            status: match outcome {
                RunOutcome::Published => PublishStatus::Published,
                RunOutcome::DryRun => PublishStatus::DryRun,
                _ => PublishStatus::Failed,
            },
            note_id: match outcome {
                RunOutcome::Published => Some(format!("note-{}", run_id)),
                _ => None,
            },
            error_message: None,
            published_at: Utc::now(),
        }),
        outcome,
        error: None,
        started_at: Utc::now(),
        completed_at: Utc::now(),
    }
}

#[test]
fn every_run_is_appended_in_order() -> Result<()> {
    let dir = TempDir::new()?;
    let history = History::new(dir.path().join("data/history.json"));

    history.append(&result_for("run1", RunOutcome::Published, "art001"))?;
    history.append(&result_for("run2", RunOutcome::Failed, "art002"))?;
    history.append(&result_for("run3", RunOutcome::DryRun, "art003"))?;

    let entries = history.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].run_id, "run1");
    assert_eq!(entries[2].run_id, "run3");
    assert_eq!(entries[0].note_id.as_deref(), Some("note-run1"));
    assert!(entries[1].note_id.is_none());
    Ok(())
}

#[test]
fn only_published_runs_feed_dedup() -> Result<()> {
    let dir = TempDir::new()?;
    let history = History::new(dir.path().join("history.json"));

    history.append(&result_for("run1", RunOutcome::Published, "art001"))?;
    history.append(&result_for("run2", RunOutcome::Failed, "art002"))?;
    history.append(&result_for("run3", RunOutcome::DryRun, "art003"))?;

    let published = history.published_article_ids();
    assert_eq!(published.len(), 1);
    assert!(published.contains("art001"));
    Ok(())
}

#[test]
fn missing_and_corrupt_files_read_as_empty() -> Result<()> {
    let dir = TempDir::new()?;
    let missing = History::new(dir.path().join("nowhere.json"));
    assert!(missing.entries().is_empty());

    let corrupt_path = dir.path().join("corrupt.json");
    std::fs::write(&corrupt_path, "{not json")?;
    let corrupt = History::new(corrupt_path);
    assert!(corrupt.entries().is_empty());
    // A corrupt record never blocks a new append.
    corrupt.append(&result_for("run1", RunOutcome::Published, "art001"))?;
    assert_eq!(corrupt.entries().len(), 1);
    Ok(())
}
