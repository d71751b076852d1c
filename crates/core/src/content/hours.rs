//! Opening-hours text normalization.
//!
//! Place imports store hours as the provider's JSON object; hand-edited
//! sections store a plain string. Contact normalization funnels both through
//! here so the stored value is always display-ready text.

use serde_json::Value;

const HOURS_DESCRIPTION_KEY: &str = "weekdayDescriptions";

fn extract_weekday_descriptions(value: &Value) -> Option<Vec<String>> {
    let entries = value.as_array()?;
    let cleaned: Vec<String> = entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Format a provider hours object into a single display line, if it carries
/// the expected weekday descriptions.
pub fn format_hours_from_json(hours: &Value) -> Option<String> {
    let object = hours.as_object()?;
    let descriptions = extract_weekday_descriptions(object.get(HOURS_DESCRIPTION_KEY)?)?;
    Some(descriptions.join(" • "))
}

/// Normalize a stored hours value: JSON objects are formatted, anything else
/// passes through unchanged. Blank input is treated as absent.
pub fn normalize_hours_text(value: Option<String>) -> Option<String> {
    let value = value?;
    if value.trim().is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(&value) {
        if let Some(formatted) = format_hours_from_json(&parsed) {
            return Some(formatted);
        }
    }

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_weekday_descriptions() {
        let hours = json!({
            "weekdayDescriptions": ["Mon: 9–5", "Tue: 9–5", "  ", "Wed: closed"],
        });
        assert_eq!(
            format_hours_from_json(&hours),
            Some("Mon: 9–5 • Tue: 9–5 • Wed: closed".to_string())
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(
            normalize_hours_text(Some("Open daily 9-5".to_string())),
            Some("Open daily 9-5".to_string())
        );
    }

    #[test]
    fn blank_is_absent() {
        assert_eq!(normalize_hours_text(Some("   ".to_string())), None);
        assert_eq!(normalize_hours_text(None), None);
    }

    #[test]
    fn json_without_descriptions_passes_through() {
        let raw = r#"{"periods":[]}"#.to_string();
        assert_eq!(normalize_hours_text(Some(raw.clone())), Some(raw));
    }

    #[test]
    fn formatting_is_idempotent() {
        let raw = json!({"weekdayDescriptions": ["Mon: 9–5"]}).to_string();
        let once = normalize_hours_text(Some(raw));
        let twice = normalize_hours_text(once.clone());
        assert_eq!(once, twice);
    }
}
