use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xhs_autopilot::publish::McpPublisher;
use xhs_autopilot::scheduler::{parse_times, Scheduler};
use xhs_autopilot::{AccountProfile, Config, Pipeline, RunOutcome};

#[derive(Parser)]
#[command(name = "xhs-autopilot", about = "Automated Xiaohongshu content pipeline", version)]
struct Cli {
    /// Path to the main configuration file
    #[arg(long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the account profile file
    #[arg(long, global = true, default_value = "account-profile.yaml")]
    profile: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and exit
    Run {
        /// Generate everything but do not publish
        #[arg(long)]
        dry_run: bool,
        /// Skip image generation
        #[arg(long)]
        skip_images: bool,
    },
    /// Run on the configured daily schedule until interrupted
    Schedule {
        /// Generate everything but do not publish
        #[arg(long)]
        dry_run: bool,
    },
    /// Show recent run history
    History {
        /// Number of entries to show, newest first
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Check the MCP server's Xiaohongshu login state
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { dry_run, skip_images } => {
            run_once(&cli.config, &cli.profile, dry_run, skip_images).await
        }
        Command::Schedule { dry_run } => run_scheduler(&cli.config, &cli.profile, dry_run).await,
        Command::History { limit } => show_history(&cli.config, limit),
        Command::Status => show_status(&cli.config).await,
    }
}

fn load(config_path: &PathBuf, profile_path: &PathBuf) -> anyhow::Result<(Config, AccountProfile)> {
    let config = Config::load(config_path).context("loading configuration")?;
    let profile = AccountProfile::load(profile_path).context("loading account profile")?;
    Ok((config, profile))
}

async fn run_once(
    config_path: &PathBuf,
    profile_path: &PathBuf,
    dry_run: bool,
    skip_images: bool,
) -> anyhow::Result<()> {
    let (config, profile) = load(config_path, profile_path)?;
    let pipeline = Pipeline::from_config(config, profile).context("building pipeline")?;
    let result = pipeline.run(dry_run, skip_images).await?;

    println!("run {} finished: {}", result.run_id, result.outcome);
    if result.outcome == RunOutcome::Failed {
        bail!(
            "run failed: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}

async fn run_scheduler(
    config_path: &PathBuf,
    profile_path: &PathBuf,
    dry_run: bool,
) -> anyhow::Result<()> {
    // Fail fast on bad configuration before the first trigger.
    let (config, profile) = load(config_path, profile_path)?;
    Pipeline::from_config(config.clone(), profile.clone()).context("building pipeline")?;

    let times = parse_times(&config.schedule.times)?;
    let scheduler = Scheduler::new(times, config.schedule.timezone, config.schedule.jitter_minutes)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let config_path = config_path.clone();
    let profile_path = profile_path.clone();
    scheduler
        .run(
            move |run_number| {
                let config_path = config_path.clone();
                let profile_path = profile_path.clone();
                async move {
                    info!("scheduled run #{}", run_number);
                    // Reload so edits to config and styles apply without a
                    // restart.
                    let pipeline = match load(&config_path, &profile_path)
                        .and_then(|(c, p)| Ok(Pipeline::from_config(c, p)?))
                    {
                        Ok(pipeline) => pipeline,
                        Err(e) => {
                            error!("cannot build pipeline: {:#}", e);
                            return;
                        }
                    };
                    if let Err(e) = pipeline.run(dry_run, false).await {
                        error!("scheduled run #{} failed: {}", run_number, e);
                    }
                }
            },
            shutdown_rx,
        )
        .await;
    Ok(())
}

fn show_history(config_path: &PathBuf, limit: usize) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("loading configuration")?;
    let history = xhs_autopilot::History::new(config.output.history_file);
    let entries = history.entries();
    if entries.is_empty() {
        println!("no runs recorded yet");
        return Ok(());
    }
    for entry in entries.iter().rev().take(limit) {
        println!(
            "{}  {:10}  article={}  note={}  {}",
            entry.started_at.format("%Y-%m-%d %H:%M:%S"),
            entry.outcome.to_string(),
            entry.article_id.as_deref().unwrap_or("-"),
            entry.note_id.as_deref().unwrap_or("-"),
            entry.error.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

async fn show_status(config_path: &PathBuf) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("loading configuration")?;
    let publisher = McpPublisher::new(&config.publish.mcp_server_url)?;
    if publisher.check_login().await {
        println!("mcp server at {} is logged in", config.publish.mcp_server_url);
    } else {
        println!("mcp server at {} is NOT logged in", config.publish.mcp_server_url);
        std::process::exit(1);
    }
    Ok(())
}
