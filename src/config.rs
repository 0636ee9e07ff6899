use crate::types::{PipelineError, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Fully-resolved process configuration. `${VAR}` references in the YAML are
/// substituted from the environment at load time; nothing reads the
/// environment after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub styles: StylesConfig,
    #[serde(default)]
    pub imagen: ImageGenConfig,
    #[serde(default)]
    pub collect: CollectConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let mut value: serde_yaml::Value = serde_yaml::from_str(&raw)
            .map_err(|e| PipelineError::Config(format!("invalid YAML in {}: {}", path.display(), e)))?;
        resolve_env_vars(&mut value)?;
        serde_yaml::from_value(value)
            .map_err(|e| PipelineError::Config(format!("invalid config {}: {}", path.display(), e)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            styles: StylesConfig::default(),
            imagen: ImageGenConfig::default(),
            collect: CollectConfig::default(),
            output: OutputConfig::default(),
            publish: PublishConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    Anthropic,
    Openai,
}

/// Which AI backend to use and how to reach it. Selection happens once, at
/// configuration load.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_type: ApiType,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_type: ApiType::Anthropic,
            api_key: String::new(),
            model: "MiniMax-M2.5".to_string(),
            base_url: "https://api.minimax.io/anthropic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageGenConfig {
    pub api_key: String,
    pub model: String,
    pub number_of_images: usize,
    pub image_size: String,
    pub base_url: String,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "doubao-seedream-4-5-251128".to_string(),
            number_of_images: 3,
            image_size: "2048x2720".to_string(),
            base_url: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    pub rss_feeds: Vec<FeedConfig>,
    pub news_api: Option<NewsApiConfig>,
    pub max_age_hours: i64,
    pub max_candidates: usize,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            rss_feeds: Vec::new(),
            news_api: None,
            max_age_hours: 48,
            max_candidates: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

fn default_lang() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiConfig {
    pub api_key: String,
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    20
}

/// Style catalog locations plus the fallback pair used when the AI decision
/// cannot be completed. The defaults are validated against the catalogs at
/// startup; an unknown id refuses to start.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    pub filter: PathBuf,
    pub copywrite: PathBuf,
    pub image: PathBuf,
    pub default_copy_style: String,
    pub default_image_style: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub history_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            history_file: PathBuf::from("./data/history.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub mcp_server_url: String,
    pub dry_run: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            mcp_server_url: "http://localhost:18060".to_string(),
            dry_run: false,
        }
    }
}

/// Trigger times are wall-clock times in `timezone`, not UTC. The audience
/// is in China, so the default zone is Asia/Shanghai.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub times: Vec<String>,
    pub timezone: chrono_tz::Tz,
    pub jitter_minutes: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            times: vec!["08:00".to_string(), "12:00".to_string(), "20:00".to_string()],
            timezone: chrono_tz::Tz::Asia__Shanghai,
            jitter_minutes: 30,
        }
    }
}

/// The account persona driving selection and copy prompts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountProfile {
    pub name: String,
    pub domain: String,
    pub persona: String,
    pub target_audience: String,
    pub tone: String,
    pub app_name: String,
    pub app_download_cta: String,
    pub forbidden_topics: Vec<String>,
    pub preferred_angles: Vec<String>,
    pub title_max_length: usize,
    pub body_max_length: usize,
    pub hashtag_count: usize,
    pub call_to_action: String,
}

impl Default for AccountProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            domain: String::new(),
            persona: String::new(),
            target_audience: String::new(),
            tone: String::new(),
            app_name: String::new(),
            app_download_cta: String::new(),
            forbidden_topics: Vec::new(),
            preferred_angles: Vec::new(),
            title_max_length: 20,
            body_max_length: 1000,
            hashtag_count: 5,
            call_to_action: String::new(),
        }
    }
}

impl AccountProfile {
    /// Load from the profile YAML, which groups fields under `account`,
    /// `content` and `style` sections.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read profile {}: {}", path.display(), e))
        })?;
        let file: ProfileFile = serde_yaml::from_str(&raw)
            .map_err(|e| PipelineError::Config(format!("invalid profile {}: {}", path.display(), e)))?;

        let defaults = AccountProfile::default();
        Ok(Self {
            name: file.account.name,
            domain: file.account.domain,
            persona: file.account.persona,
            target_audience: file.account.target_audience,
            tone: file.account.tone,
            app_name: file.account.app_name,
            app_download_cta: file.account.app_download_cta,
            forbidden_topics: file.content.forbidden_topics,
            preferred_angles: file.content.preferred_angles,
            title_max_length: file.content.title_max_length.unwrap_or(defaults.title_max_length),
            body_max_length: file.content.body_max_length.unwrap_or(defaults.body_max_length),
            hashtag_count: file.content.hashtag_count.unwrap_or(defaults.hashtag_count),
            call_to_action: file.style.call_to_action,
        })
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ProfileFile {
    account: AccountSection,
    content: ContentSection,
    style: StyleSection,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct AccountSection {
    name: String,
    domain: String,
    persona: String,
    target_audience: String,
    tone: String,
    app_name: String,
    app_download_cta: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ContentSection {
    forbidden_topics: Vec<String>,
    preferred_angles: Vec<String>,
    title_max_length: Option<usize>,
    body_max_length: Option<usize>,
    hashtag_count: Option<usize>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct StyleSection {
    call_to_action: String,
}

fn resolve_env_vars(value: &mut serde_yaml::Value) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => {
            *s = substitute(s)?;
        }
        serde_yaml::Value::Sequence(seq) => {
            for item in seq {
                resolve_env_vars(item)?;
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                resolve_env_vars(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Replace every `${VAR}` in `input` with the variable's value. A missing
/// variable is a configuration error, not an empty string.
fn substitute(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            PipelineError::Config(format!("unterminated ${{}} reference in {:?}", input))
        })?;
        let name = &after[..end];
        let value = env::var(name)
            .map_err(|_| PipelineError::Config(format!("environment variable not set: {}", name)))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
