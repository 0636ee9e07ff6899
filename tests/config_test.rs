use std::io::Write as _;
use tempfile::NamedTempFile;
use xhs_autopilot::config::{AccountProfile, ApiType, Config};
use xhs_autopilot::types::Result;

fn write_file(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn env_references_are_resolved_at_load() -> Result<()> {
    std::env::set_var("XHS_TEST_API_KEY", "sk-from-env");
    let file = write_file(
        r#"
provider:
  api_type: openai
  api_key: "${XHS_TEST_API_KEY}"
  model: deepseek-chat
  base_url: https://api.deepseek.com
styles:
  filter: styles/filter.yaml
  copywrite: styles/copywrite.yaml
  image: styles/image.yaml
  default_copy_style: warm
  default_image_style: flat
collect:
  rss_feeds:
    - name: Health Feed
      url: https://example.com/rss
"#,
    )?;

    let config = Config::load(file.path())?;
    assert_eq!(config.provider.api_type, ApiType::Openai);
    assert_eq!(config.provider.api_key, "sk-from-env");
    assert_eq!(config.collect.rss_feeds.len(), 1);
    assert_eq!(config.collect.rss_feeds[0].lang, "en");
    // Untouched sections keep their defaults.
    assert_eq!(config.collect.max_age_hours, 48);
    assert_eq!(config.schedule.times.len(), 3);
    assert_eq!(config.schedule.timezone, chrono_tz::Tz::Asia__Shanghai);
    assert_eq!(config.schedule.jitter_minutes, 30);
    assert!(!config.publish.dry_run);
    Ok(())
}

#[test]
fn schedule_timezone_is_configurable() -> Result<()> {
    let file = write_file(
        r#"
provider:
  api_key: key
styles:
  filter: f.yaml
  copywrite: c.yaml
  image: i.yaml
schedule:
  times: ["09:00"]
  timezone: Europe/Berlin
"#,
    )?;

    let config = Config::load(file.path())?;
    assert_eq!(config.schedule.timezone, chrono_tz::Tz::Europe__Berlin);
    assert_eq!(config.schedule.times, vec!["09:00"]);
    Ok(())
}

#[test]
fn missing_env_variable_is_a_config_error() -> Result<()> {
    std::env::remove_var("XHS_TEST_MISSING_KEY");
    let file = write_file(
        r#"
provider:
  api_key: "${XHS_TEST_MISSING_KEY}"
styles:
  filter: f.yaml
  copywrite: c.yaml
  image: i.yaml
"#,
    )?;

    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("XHS_TEST_MISSING_KEY"));
    Ok(())
}

#[test]
fn unterminated_env_reference_is_rejected() -> Result<()> {
    let file = write_file(
        r#"
provider:
  api_key: "${UNCLOSED"
styles:
  filter: f.yaml
  copywrite: c.yaml
  image: i.yaml
"#,
    )?;

    assert!(Config::load(file.path()).is_err());
    Ok(())
}

#[test]
fn profile_sections_flatten_with_content_defaults() -> Result<()> {
    let file = write_file(
        r#"
account:
  name: 健康小助手
  domain: nutrition news
  persona: cheerful dietician
  target_audience: busy office workers
  tone: warm and practical
  app_name: HealthApp
  app_download_cta: 下载 HealthApp 了解更多
content:
  forbidden_topics:
    - politics
  preferred_angles:
    - practical tips
  title_max_length: 18
style:
  call_to_action: 关注我获取每日健康资讯
"#,
    )?;

    let profile = AccountProfile::load(file.path())?;
    assert_eq!(profile.name, "健康小助手");
    assert_eq!(profile.title_max_length, 18);
    // Omitted limits fall back.
    assert_eq!(profile.body_max_length, 1000);
    assert_eq!(profile.hashtag_count, 5);
    assert_eq!(profile.forbidden_topics, vec!["politics"]);
    assert_eq!(profile.call_to_action, "关注我获取每日健康资讯");
    Ok(())
}
