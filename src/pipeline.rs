use crate::collect::collect_all;
use crate::config::{AccountProfile, Config};
use crate::copywrite::CopywriteGenerator;
use crate::history::History;
use crate::image::{ArkImageGenerator, GenerateImages};
use crate::providers::{build_provider, AiProvider};
use crate::publish::{McpPublisher, PublishNote};
use crate::selector::ArticleSelector;
use crate::sources::{NewsApiSource, PullArticles, RssFeedSource};
use crate::styles::{StyleCatalog, StyleManager};
use crate::types::{
    PipelineError, PipelineResult, PublishResult, PublishStatus, Result, RunOutcome,
};
use chrono::{Local, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// The full collect-select-generate-publish run. Collaborators sit behind
/// traits so tests can substitute every network edge.
pub struct Pipeline {
    config: Config,
    profile: AccountProfile,
    provider: Arc<dyn AiProvider>,
    styles: StyleManager,
    sources: Vec<Box<dyn PullArticles>>,
    image_gen: Box<dyn GenerateImages>,
    publisher: Box<dyn PublishNote>,
    history: History,
}

impl Pipeline {
    /// Wire up production collaborators from configuration.
    pub fn from_config(config: Config, profile: AccountProfile) -> Result<Self> {
        let provider = build_provider(&config.provider)?;
        let catalog = StyleCatalog::load(&config.styles)?;

        let mut sources: Vec<Box<dyn PullArticles>> = Vec::new();
        for feed in &config.collect.rss_feeds {
            sources.push(Box::new(RssFeedSource::new(&feed.name, &feed.url, &feed.lang)?));
        }
        if let Some(news) = &config.collect.news_api {
            sources.push(Box::new(NewsApiSource::new(
                &news.api_key,
                &news.queries,
                news.max_results,
                config.collect.max_age_hours,
            )?));
        }

        let image_gen = Box::new(ArkImageGenerator::new(&config.imagen)?);
        let publisher = Box::new(McpPublisher::new(&config.publish.mcp_server_url)?);
        let history = History::new(config.output.history_file.clone());

        Ok(Self {
            styles: StyleManager::new(catalog, provider.clone()),
            config,
            profile,
            provider,
            sources,
            image_gen,
            publisher,
            history,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        profile: AccountProfile,
        provider: Arc<dyn AiProvider>,
        catalog: StyleCatalog,
        sources: Vec<Box<dyn PullArticles>>,
        image_gen: Box<dyn GenerateImages>,
        publisher: Box<dyn PublishNote>,
        history: History,
    ) -> Self {
        Self {
            styles: StyleManager::new(catalog, provider.clone()),
            config,
            profile,
            provider,
            sources,
            image_gen,
            publisher,
            history,
        }
    }

    /// Execute one run end to end. Always returns a result and always
    /// appends it to history; stage failures become a `failed` outcome
    /// rather than a missing record.
    pub async fn run(&self, dry_run: bool, skip_images: bool) -> Result<PipelineResult> {
        let dry_run = dry_run || self.config.publish.dry_run;
        let started_at = Utc::now();
        let run_id = format!(
            "{}_{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..6]
        );
        info!("starting run {} (dry_run={})", run_id, dry_run);

        let out_dir = self.config.output.dir.join(&run_id);
        let mut result = match self.execute(&run_id, &out_dir, dry_run, skip_images).await {
            Ok(result) => result,
            Err(e) => {
                error!("run {} failed: {}", run_id, e);
                let outcome = match e {
                    PipelineError::SelectionEmpty => RunOutcome::NoContent,
                    _ => RunOutcome::Failed,
                };
                PipelineResult {
                    run_id: run_id.clone(),
                    articles_collected: 0,
                    filter_result: None,
                    style: None,
                    copywrite: None,
                    images: Vec::new(),
                    publish_result: None,
                    outcome,
                    error: Some(e.to_string()),
                    started_at,
                    completed_at: Utc::now(),
                }
            }
        };
        result.started_at = started_at;
        result.completed_at = Utc::now();

        // History comes first: the run record must land even when the
        // artifact directory cannot be written.
        self.history.append(&result)?;
        if let Err(e) = self.save_run_output(&out_dir, &result) {
            error!("run {} artifacts not written: {}", run_id, e);
        }
        info!("run {} finished: {}", run_id, result.outcome);
        Ok(result)
    }

    async fn execute(
        &self,
        run_id: &str,
        out_dir: &Path,
        dry_run: bool,
        skip_images: bool,
    ) -> Result<PipelineResult> {
        let candidates = collect_all(
            &self.sources,
            &self.history,
            self.config.collect.max_age_hours,
            self.config.collect.max_candidates,
        )
        .await?;
        if candidates.is_empty() {
            return Ok(no_content_result(run_id, 0));
        }
        let articles_collected = candidates.len();

        let selector = ArticleSelector::new(
            self.provider.clone(),
            self.styles.catalog().filter_prompt.clone(),
        );
        let filter = match selector.select(&candidates, &self.profile).await {
            Ok(filter) => filter,
            Err(PipelineError::SelectionEmpty) => {
                return Ok(no_content_result(run_id, articles_collected));
            }
            Err(e) => return Err(e),
        };

        let decision = self.styles.decide(&filter.selected_article).await;
        let copy_style = self
            .styles
            .catalog()
            .copy_style(&decision.copy_style_id)
            .ok_or_else(|| {
                PipelineError::Config(format!("copy style {:?} vanished", decision.copy_style_id))
            })?
            .clone();
        let image_style = self
            .styles
            .catalog()
            .image_style(&decision.image_style_id)
            .ok_or_else(|| {
                PipelineError::Config(format!("image style {:?} vanished", decision.image_style_id))
            })?
            .clone();

        let generator = CopywriteGenerator::new(self.provider.clone());
        let images_dir = out_dir.join("images");
        let copy_fut = generator.generate(&filter, &self.profile, &copy_style);
        let image_fut = async {
            if skip_images {
                Ok(Vec::new())
            } else {
                self.image_gen.generate(&filter, &image_style, &images_dir).await
            }
        };
        let (copywrite, images) = tokio::try_join!(copy_fut, image_fut)?;

        let publish_result = if dry_run {
            info!("dry run, skipping publish for run {}", run_id);
            PublishResult {
                status: PublishStatus::DryRun,
                note_id: None,
                error_message: None,
                published_at: Utc::now(),
            }
        } else {
            self.publisher.publish(&copywrite, &images).await?
        };

        let outcome = match publish_result.status {
            PublishStatus::Published => RunOutcome::Published,
            PublishStatus::DryRun => RunOutcome::DryRun,
            PublishStatus::Failed => RunOutcome::Failed,
        };
        let error = publish_result.error_message.clone();

        Ok(PipelineResult {
            run_id: run_id.to_string(),
            articles_collected,
            filter_result: Some(filter),
            style: Some(decision),
            copywrite: Some(copywrite),
            images,
            publish_result: Some(publish_result),
            outcome,
            error,
            started_at: Utc::now(),
            completed_at: Utc::now(),
        })
    }

    fn save_run_output(&self, out_dir: &Path, result: &PipelineResult) -> Result<()> {
        std::fs::create_dir_all(out_dir)?;
        if let Some(filter) = &result.filter_result {
            write_json(&out_dir.join("filter_result.json"), filter)?;
        }
        if let Some(copy) = &result.copywrite {
            write_json(&out_dir.join("copywrite.json"), copy)?;
        }
        if let Some(publish) = &result.publish_result {
            write_json(&out_dir.join("publish_result.json"), publish)?;
        }
        write_json(&out_dir.join("pipeline_result.json"), result)?;
        Ok(())
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

fn no_content_result(run_id: &str, articles_collected: usize) -> PipelineResult {
    info!("run {} produced no content ({} candidates)", run_id, articles_collected);
    PipelineResult {
        run_id: run_id.to_string(),
        articles_collected,
        filter_result: None,
        style: None,
        copywrite: None,
        images: Vec::new(),
        publish_result: None,
        outcome: RunOutcome::NoContent,
        error: None,
        started_at: Utc::now(),
        completed_at: Utc::now(),
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
