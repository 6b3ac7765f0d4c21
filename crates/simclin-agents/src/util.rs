use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;

/// Parse a JSON object out of model output, tolerating markdown code
/// fences and leading prose around the first `{ ... }` block.
pub(crate) fn parse_json_output<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim);
    if let Some(unfenced) = unfenced {
        if let Ok(value) = serde_json::from_str(unfenced) {
            return Ok(value);
        }
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(anyhow!("model output did not parse as JSON"))
}
