use crate::types::{PipelineResult, PublishStatus, Result, RunOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::warn;

/// One line of the append-only run record. Every run gets an entry,
/// successful or not; only published entries feed dedup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub article_id: Option<String>,
    pub note_id: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All recorded entries, oldest first. A missing file means no history
    /// yet; a corrupt file is logged and treated the same, so a damaged
    /// record never blocks publishing.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("history file {} is corrupt, ignoring: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn append(&self, result: &PipelineResult) -> Result<()> {
        let mut entries = self.entries();
        entries.push(HistoryEntry {
            run_id: result.run_id.clone(),
            outcome: result.outcome,
            article_id: result
                .filter_result
                .as_ref()
                .map(|f| f.selected_article.id.clone()),
            note_id: result
                .publish_result
                .as_ref()
                .filter(|p| p.status == PublishStatus::Published)
                .and_then(|p| p.note_id.clone()),
            error: result.error.clone(),
            started_at: result.started_at,
            completed_at: result.completed_at,
        });

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }

    /// Article ids of runs that actually published. Dry runs and failures
    /// leave their article eligible for a later attempt.
    pub fn published_article_ids(&self) -> HashSet<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.outcome == RunOutcome::Published)
            .filter_map(|e| e.article_id)
            .collect()
    }
}
