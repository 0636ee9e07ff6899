use crate::types::{PipelineError, Result};
use serde_json::Value;

/// Extract a JSON object from free-form model output.
///
/// Strips markdown code fences, then parses the substring from the first `{`
/// to the last `}`. Tolerates models that wrap JSON in prose or fences.
pub fn extract_json(text: &str) -> Result<Value> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => serde_json::from_str(&cleaned[start..=end])
            .map_err(|e| PipelineError::Parse(format!("invalid JSON in model output: {}", e))),
        _ => Err(PipelineError::Parse(format!(
            "no JSON object in model output: {}",
            cleaned.chars().take(200).collect::<String>()
        ))),
    }
}

/// Render `{key}` placeholders in a prompt template.
pub fn render_template(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

/// Truncate to at most `max` characters, not bytes. Titles and bodies carry
/// CJK text, so byte truncation would split characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
