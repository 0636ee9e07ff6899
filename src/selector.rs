use crate::config::AccountProfile;
use crate::providers::AiProvider;
use crate::styles::FilterPrompt;
use crate::types::{Article, FilterResult, PipelineError, Result};
use crate::utils::{extract_json, render_template, truncate_chars};
use std::sync::Arc;
use tracing::{info, warn};

/// Asks the provider to pick the single best candidate for the account and
/// to sketch what the note should say.
pub struct ArticleSelector {
    provider: Arc<dyn AiProvider>,
    prompt: FilterPrompt,
}

impl ArticleSelector {
    pub fn new(provider: Arc<dyn AiProvider>, prompt: FilterPrompt) -> Self {
        Self { provider, prompt }
    }

    pub async fn select(&self, articles: &[Article], profile: &AccountProfile) -> Result<FilterResult> {
        if articles.is_empty() {
            return Err(PipelineError::SelectionEmpty);
        }

        let user_prompt = render_template(
            &self.prompt.user_prompt,
            &[
                ("name", profile.name.clone()),
                ("domain", profile.domain.clone()),
                ("persona", profile.persona.clone()),
                ("target_audience", profile.target_audience.clone()),
                ("preferred_angles", profile.preferred_angles.join(", ")),
                ("forbidden_topics", profile.forbidden_topics.join(", ")),
                ("count", articles.len().to_string()),
                ("articles_text", format_articles(articles)),
            ],
        );

        let response = self
            .provider
            .generate(&user_prompt, &self.prompt.system_prompt)
            .await?;
        let value = extract_json(&response)?;

        let mut index = value["selected_index"].as_u64().unwrap_or(0) as usize;
        if index >= articles.len() {
            warn!("selected index {} out of range, using first candidate", index);
            index = 0;
        }
        let selected = articles[index].clone();

        let key_points = value["key_points"]
            .as_array()
            .map(|points| {
                points
                    .iter()
                    .filter_map(|p| p.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let image_subject = value["image_subject"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or("news illustration")
            .to_string();

        info!("selected article {:?} ({})", selected.title, selected.id);
        Ok(FilterResult {
            selected_article: selected,
            relevance_score: value["relevance_score"].as_f64().unwrap_or(0.0),
            key_points,
            image_subject,
            reasoning: value["reasoning"].as_str().unwrap_or_default().to_string(),
        })
    }
}

fn format_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "[{i}] title: {title}\n    source: {source} ({lang})\n    summary: {summary}",
                i = i,
                title = a.title,
                source = a.source_name,
                lang = a.language,
                summary = truncate_chars(&a.summary, 200),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
