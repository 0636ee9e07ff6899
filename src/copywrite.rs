use crate::config::AccountProfile;
use crate::providers::AiProvider;
use crate::styles::CopyStyle;
use crate::types::{FilterResult, PipelineError, Result, XhsCopywrite};
use crate::utils::{extract_json, render_template, truncate_chars};
use std::sync::Arc;
use tracing::info;

/// Turns a selected article into note copy in the chosen style.
pub struct CopywriteGenerator {
    provider: Arc<dyn AiProvider>,
}

impl CopywriteGenerator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(
        &self,
        filter: &FilterResult,
        profile: &AccountProfile,
        style: &CopyStyle,
    ) -> Result<XhsCopywrite> {
        let key_points_text = filter
            .key_points
            .iter()
            .map(|p| format!("  - {}", p))
            .collect::<Vec<_>>()
            .join("\n");

        let user_prompt = render_template(
            &style.user_prompt,
            &[
                ("name", profile.name.clone()),
                ("domain", profile.domain.clone()),
                ("persona", profile.persona.clone()),
                ("target_audience", profile.target_audience.clone()),
                ("tone", profile.tone.clone()),
                ("app_download_cta", profile.app_download_cta.clone()),
                ("call_to_action", profile.call_to_action.clone()),
                ("article_title", filter.selected_article.title.clone()),
                ("article_summary", filter.selected_article.summary.clone()),
                ("key_points_text", key_points_text),
                ("title_max_length", profile.title_max_length.to_string()),
                ("body_max_length", profile.body_max_length.to_string()),
                ("hashtag_count", profile.hashtag_count.to_string()),
            ],
        );

        let response = self
            .provider
            .generate(&user_prompt, &style.system_prompt)
            .await?;
        let value = extract_json(&response)?;

        let title = value["title"].as_str().unwrap_or_default().trim().to_string();
        let body = value["body"].as_str().unwrap_or_default().trim().to_string();
        if title.is_empty() || body.is_empty() {
            return Err(PipelineError::Parse(
                "copywrite response missing title or body".to_string(),
            ));
        }

        let hashtags = value["hashtags"]
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str())
                    .map(|t| t.trim_start_matches('#').to_string())
                    .filter(|t| !t.is_empty())
                    .take(profile.hashtag_count)
                    .collect()
            })
            .unwrap_or_default();

        let copy = XhsCopywrite {
            title: truncate_chars(&title, profile.title_max_length),
            body: truncate_chars(&body, profile.body_max_length),
            hashtags,
        };
        info!("generated copy {:?} with {} hashtags", copy.title, copy.hashtags.len());
        Ok(copy)
    }
}
