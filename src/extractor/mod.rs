//! Extractor (C7): hybrid pattern + conditional LLM pipeline.

pub mod llm;
pub mod pattern;

use crate::core::config::RuntimeConfig;
use crate::core::types::{Column, ColumnDataType, ExtractedData, ExtractedValue};

/// Strip HTML tags and collapse whitespace before LLM prompting, matching
/// §4.7's "preprocessed text" requirement.
pub fn preprocess_for_llm(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub async fn extract_hybrid(
    client: &reqwest::Client,
    cfg: &RuntimeConfig,
    text: &str,
    input_keywords: &[String],
    columns: &[Column],
    use_ai: bool,
    smart_mode: bool,
) -> ExtractedData {
    let pattern_result = pattern::extract(text, input_keywords);

    if llm::should_run_llm(use_ai, smart_mode, pattern_result.confidence, cfg) {
        let preprocessed = preprocess_for_llm(text);
        llm::run_and_merge(client, cfg, &preprocessed, columns, pattern_result).await
    } else {
        pattern_result
    }
}

/// Coerce a raw string value to the column's declared type. Returns `None`
/// to mean "drop" — e.g. `"n/a"` is omitted entirely, never stored as a
/// null-string (§8 scenario 6).
pub fn coerce(value: &str, data_type: ColumnDataType) -> Option<ExtractedValue> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") || trimmed.eq_ignore_ascii_case("unknown") {
        return None;
    }

    match data_type {
        ColumnDataType::Text | ColumnDataType::Email | ColumnDataType::Phone | ColumnDataType::Url => {
            Some(ExtractedValue::Str(trimmed.to_string()))
        }
        ColumnDataType::Number | ColumnDataType::Currency => {
            let digits_only: String = trimmed
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            digits_only.parse::<f64>().ok().map(ExtractedValue::Number)
        }
        ColumnDataType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(ExtractedValue::Bool(true)),
            "false" | "no" | "0" => Some(ExtractedValue::Bool(false)),
            _ => None,
        },
        ColumnDataType::Date => chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(ExtractedValue::Date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_numeric_field_stripping_units() {
        let v = coerce("120 rooms", ColumnDataType::Number).unwrap();
        assert_eq!(v, ExtractedValue::Number(120.0));
    }

    #[test]
    fn drops_na_value() {
        assert!(coerce("n/a", ColumnDataType::Text).is_none());
    }

    #[test]
    fn drops_unknown_value() {
        assert!(coerce("Unknown", ColumnDataType::Text).is_none());
    }

    #[test]
    fn coerces_boolean_field() {
        assert_eq!(coerce("yes", ColumnDataType::Boolean), Some(ExtractedValue::Bool(true)));
    }

    #[test]
    fn preprocess_strips_html_tags() {
        let html = "<p>Hello <b>World</b></p>";
        assert_eq!(preprocess_for_llm(html), "Hello World");
    }
}
