//! Conditional LLM extraction pass (C7 step 2).
//!
//! Reuses the teacher's `core/config.rs` env-fallback pattern
//! (`resolve_api_key`/`resolve_base_url`/`resolve_model`), retargeted at
//! `DEEPSEEK_API_KEY` and the chat-completions wire contract from spec §6.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::core::config::RuntimeConfig;
use crate::core::types::{Column, ExtractedData};

const SYSTEM_PROMPT: &str = "You are a structured-data extraction engine. Respond with a single JSON object only, no prose.";

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Deserialize)]
struct ChatMessageOut {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

fn build_prompt(preprocessed_text: &str, columns: &[Column]) -> String {
    let mut fields = vec!["company", "location", "projectType", "budget"];
    let custom: Vec<String> = columns
        .iter()
        .map(|c| format!("{} ({})", c.field_key, c.description))
        .collect();
    let custom_refs: Vec<&str> = custom.iter().map(|s| s.as_str()).collect();
    fields.extend(custom_refs);

    let truncated: String = preprocessed_text.chars().take(1500).collect();

    format!(
        "Extract these fields as a JSON object: {}.\n\nText:\n{}",
        fields.join(", "),
        truncated
    )
}

/// Conditional on `config.useAI && apiKey && (!smartMode || patternConfidence<50)` per §4.7.
pub fn should_run_llm(use_ai: bool, smart_mode: bool, pattern_confidence: u8, llm: &RuntimeConfig) -> bool {
    use_ai && llm.llm_enabled && llm.llm_api_key.is_some() && (!smart_mode || pattern_confidence < 50)
}

/// Calls the configured LLM and merges its output into `pattern_result`,
/// preferring LLM values that are non-empty and not "Unknown". On any
/// failure, returns `pattern_result` unchanged with `ai_used=false`.
pub async fn run_and_merge(
    client: &reqwest::Client,
    cfg: &RuntimeConfig,
    preprocessed_text: &str,
    columns: &[Column],
    mut pattern_result: ExtractedData,
) -> ExtractedData {
    let Some(api_key) = &cfg.llm_api_key else {
        return pattern_result;
    };

    let prompt = build_prompt(preprocessed_text, columns);
    let request = ChatRequest {
        model: cfg.llm_model.clone(),
        messages: vec![
            ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
            ChatMessage { role: "user", content: prompt },
        ],
        temperature: 0.1,
        max_tokens: 200,
    };

    let url = format!("{}/chat/completions", cfg.llm_base_url.trim_end_matches('/'));

    let send = async {
        let resp = client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let parsed: ChatResponse = resp.json().await.map_err(|e| e.to_string())?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| "empty choices".to_string())?;
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    };

    match send.await {
        Ok(value) => {
            merge_llm_value(&mut pattern_result, &value);
            pattern_result.ai_used = true;
            pattern_result.confidence = pattern_result.confidence.max(50);
        }
        Err(e) => {
            warn!(error = e, "llm extraction pass failed, keeping pattern result");
            pattern_result.ai_used = false;
        }
    }

    pattern_result
}

fn non_empty_non_unknown(s: &str) -> bool {
    !s.trim().is_empty() && !s.eq_ignore_ascii_case("unknown")
}

fn merge_llm_value(data: &mut ExtractedData, value: &Value) {
    let Some(obj) = value.as_object() else {
        return;
    };

    if let Some(v) = obj.get("company").and_then(|v| v.as_str()) {
        if non_empty_non_unknown(v) {
            data.company = Some(v.to_string());
        }
    }
    if let Some(v) = obj.get("location").and_then(|v| v.as_str()) {
        if non_empty_non_unknown(v) {
            data.location = Some(v.to_string());
        }
    }
    if let Some(v) = obj.get("projectType").and_then(|v| v.as_str()) {
        if non_empty_non_unknown(v) {
            data.project_type = Some(v.to_string());
        }
    }
    if let Some(v) = obj.get("budget") {
        let parsed = match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.chars().filter(|c| c.is_ascii_digit()).collect::<String>().parse().ok(),
            _ => None,
        };
        if let Some(parsed) = parsed {
            data.budget = Some(parsed);
        }
    }

    for (key, v) in obj {
        if matches!(key.as_str(), "company" | "location" | "projectType" | "budget") {
            continue;
        }
        if let Some(s) = v.as_str() {
            if non_empty_non_unknown(s) {
                data.custom_fields.insert(
                    key.clone(),
                    crate::core::types::ExtractedValue::Str(s.to_string()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_runtime(use_ai_key: bool) -> RuntimeConfig {
        RuntimeConfig {
            http_timeout_ms: 1000,
            http_max_retries: 1,
            http_retry_max_elapsed_ms: 1000,
            outbound_concurrency: 1,
            enrich_concurrency: 1,
            enrich_max_chars: 1000,
            health_max_failures_before_disable: 1,
            health_error_ring_capacity: 1,
            llm_base_url: "https://api.deepseek.com/v1".to_string(),
            llm_api_key: if use_ai_key { Some("k".to_string()) } else { None },
            llm_model: "deepseek-chat".to_string(),
            llm_enabled: true,
        }
    }

    #[test]
    fn gated_off_without_api_key() {
        let cfg = base_runtime(false);
        assert!(!should_run_llm(true, false, 10, &cfg));
    }

    #[test]
    fn gated_off_when_smart_mode_and_high_confidence() {
        let cfg = base_runtime(true);
        assert!(!should_run_llm(true, true, 80, &cfg));
    }

    #[test]
    fn runs_when_smart_mode_and_low_confidence() {
        let cfg = base_runtime(true);
        assert!(should_run_llm(true, true, 20, &cfg));
    }

    #[test]
    fn merge_prefers_non_unknown_llm_values() {
        let mut data = ExtractedData::default();
        let value = serde_json::json!({"company": "Acme", "location": "Miami", "projectType": "hotel", "budget": "50000000"});
        merge_llm_value(&mut data, &value);
        assert_eq!(data.company, Some("Acme".to_string()));
        assert_eq!(data.budget, Some(50_000_000));
    }

    #[test]
    fn merge_skips_unknown_values() {
        let mut data = ExtractedData { company: Some("Existing".to_string()), ..Default::default() };
        let value = serde_json::json!({"company": "Unknown"});
        merge_llm_value(&mut data, &value);
        assert_eq!(data.company, Some("Existing".to_string()));
    }
}
