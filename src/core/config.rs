use std::path::PathBuf;

/// Static tuning knobs for the pipeline, loaded once at startup.
///
/// Search order (first found wins): `./leadscout.json`, then the path in
/// `LEADSCOUT_CONFIG`. Missing file -> defaults. Parse error -> warn, defaults.
/// Every field falls back further to an env var, then a hard default.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct LeadscoutFileConfig {
    pub http_timeout_ms: Option<u64>,
    pub http_max_retries: Option<u32>,
    pub http_retry_max_elapsed_ms: Option<u64>,
    pub outbound_concurrency: Option<usize>,
    pub enrich_concurrency: Option<usize>,
    pub enrich_max_chars: Option<usize>,
    pub health_max_failures_before_disable: Option<u32>,
    pub health_error_ring_capacity: Option<usize>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub llm_enabled: Option<bool>,
}

/// Resolved runtime settings: every `LeadscoutFileConfig` field resolved
/// through its env-var fallback and hard default.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub http_timeout_ms: u64,
    pub http_max_retries: u32,
    pub http_retry_max_elapsed_ms: u64,
    pub outbound_concurrency: usize,
    pub enrich_concurrency: usize,
    pub enrich_max_chars: usize,
    pub health_max_failures_before_disable: u32,
    pub health_error_ring_capacity: usize,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_enabled: bool,
}

impl LeadscoutFileConfig {
    /// HTTP request timeout: JSON field -> `LEADSCOUT_HTTP_TIMEOUT_MS` -> 15000.
    pub fn resolve_http_timeout_ms(&self) -> u64 {
        self.http_timeout_ms.unwrap_or_else(|| {
            env_parse("LEADSCOUT_HTTP_TIMEOUT_MS").unwrap_or(15_000)
        })
    }

    /// Max retry attempts per request: JSON field -> `LEADSCOUT_HTTP_MAX_RETRIES` -> 3.
    pub fn resolve_http_max_retries(&self) -> u32 {
        self.http_max_retries.unwrap_or_else(|| {
            env_parse("LEADSCOUT_HTTP_MAX_RETRIES").unwrap_or(3)
        })
    }

    /// Retry backoff elapsed-time cap: JSON field -> `LEADSCOUT_HTTP_RETRY_MAX_ELAPSED_MS` -> 10000.
    pub fn resolve_http_retry_max_elapsed_ms(&self) -> u64 {
        self.http_retry_max_elapsed_ms.unwrap_or_else(|| {
            env_parse("LEADSCOUT_HTTP_RETRY_MAX_ELAPSED_MS").unwrap_or(10_000)
        })
    }

    /// Concurrent outbound requests: JSON field -> `LEADSCOUT_OUTBOUND_CONCURRENCY` -> 8.
    pub fn resolve_outbound_concurrency(&self) -> usize {
        self.outbound_concurrency.unwrap_or_else(|| {
            env_parse("LEADSCOUT_OUTBOUND_CONCURRENCY").unwrap_or(8)
        })
    }

    /// Concurrent enrichment fetches: JSON field -> `LEADSCOUT_ENRICH_CONCURRENCY` -> 5.
    pub fn resolve_enrich_concurrency(&self) -> usize {
        self.enrich_concurrency.unwrap_or_else(|| {
            env_parse("LEADSCOUT_ENRICH_CONCURRENCY").unwrap_or(5)
        })
    }

    /// Per-article character cap: JSON field -> `LEADSCOUT_ENRICH_MAX_CHARS` -> 10000.
    pub fn resolve_enrich_max_chars(&self) -> usize {
        self.enrich_max_chars.unwrap_or_else(|| {
            env_parse("LEADSCOUT_ENRICH_MAX_CHARS").unwrap_or(10_000)
        })
    }

    /// Failures before an engine is disabled: JSON field -> `LEADSCOUT_HEALTH_MAX_FAILURES` -> 5.
    pub fn resolve_health_max_failures_before_disable(&self) -> u32 {
        self.health_max_failures_before_disable.unwrap_or_else(|| {
            env_parse("LEADSCOUT_HEALTH_MAX_FAILURES").unwrap_or(5)
        })
    }

    /// FIFO error ring capacity: JSON field -> `LEADSCOUT_HEALTH_ERROR_RING` -> 50.
    pub fn resolve_health_error_ring_capacity(&self) -> usize {
        self.health_error_ring_capacity.unwrap_or_else(|| {
            env_parse("LEADSCOUT_HEALTH_ERROR_RING").unwrap_or(50)
        })
    }

    /// LLM endpoint: JSON field -> `DEEPSEEK_BASE_URL` -> `https://api.deepseek.com/v1`.
    pub fn resolve_llm_base_url(&self) -> String {
        if let Some(u) = &self.llm_base_url {
            if !u.trim().is_empty() {
                return u.clone();
            }
        }
        std::env::var("DEEPSEEK_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "https://api.deepseek.com/v1".to_string())
    }

    /// API key: JSON field (even `""`, meaning "no key required") -> `DEEPSEEK_API_KEY` -> `None`.
    pub fn resolve_llm_api_key(&self) -> Option<String> {
        if let Some(k) = &self.llm_api_key {
            return Some(k.trim().to_string());
        }
        std::env::var("DEEPSEEK_API_KEY").ok().filter(|v| !v.trim().is_empty())
    }

    /// Model name: JSON field -> `DEEPSEEK_MODEL` -> `deepseek-chat`.
    pub fn resolve_llm_model(&self) -> String {
        if let Some(m) = &self.llm_model {
            if !m.trim().is_empty() {
                return m.clone();
            }
        }
        std::env::var("DEEPSEEK_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "deepseek-chat".to_string())
    }

    /// LLM extraction pass enabled: JSON field -> `LEADSCOUT_LLM_ENABLED` ("0" disables) -> true.
    pub fn resolve_llm_enabled(&self) -> bool {
        if let Some(b) = self.llm_enabled {
            return b;
        }
        std::env::var("LEADSCOUT_LLM_ENABLED")
            .map(|v| v.trim() != "0")
            .unwrap_or(true)
    }

    pub fn into_runtime(self) -> RuntimeConfig {
        RuntimeConfig {
            http_timeout_ms: self.resolve_http_timeout_ms(),
            http_max_retries: self.resolve_http_max_retries(),
            http_retry_max_elapsed_ms: self.resolve_http_retry_max_elapsed_ms(),
            outbound_concurrency: self.resolve_outbound_concurrency(),
            enrich_concurrency: self.resolve_enrich_concurrency(),
            enrich_max_chars: self.resolve_enrich_max_chars(),
            health_max_failures_before_disable: self.resolve_health_max_failures_before_disable(),
            health_error_ring_capacity: self.resolve_health_error_ring_capacity(),
            llm_base_url: self.resolve_llm_base_url(),
            llm_api_key: self.resolve_llm_api_key(),
            llm_model: self.resolve_llm_model(),
            llm_enabled: self.resolve_llm_enabled(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

pub const ENV_LEADSCOUT_CONFIG: &str = "LEADSCOUT_CONFIG";

/// Load `leadscout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `LEADSCOUT_CONFIG` env var path, if set
/// 2. `./leadscout.json`
///
/// Missing file -> `RuntimeConfig` built entirely from env vars/defaults.
/// Parse error -> log a warning, same fallback.
pub fn load_runtime_config() -> RuntimeConfig {
    let mut candidates: Vec<PathBuf> = vec![PathBuf::from("leadscout.json")];
    if let Ok(env_path) = std::env::var(ENV_LEADSCOUT_CONFIG) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<LeadscoutFileConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("leadscout.json loaded from {}", path.display());
                    return cfg.into_runtime();
                }
                Err(e) => {
                    tracing::warn!(
                        "leadscout.json parse error at {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    return LeadscoutFileConfig::default().into_runtime();
                }
            },
            Err(_) => continue,
        }
    }

    LeadscoutFileConfig::default().into_runtime()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_absent() {
        let cfg = LeadscoutFileConfig::default().into_runtime();
        assert_eq!(cfg.http_max_retries, 3);
        assert_eq!(cfg.health_error_ring_capacity, 50);
        assert_eq!(cfg.llm_model, "deepseek-chat");
    }

    #[test]
    fn explicit_empty_api_key_means_no_key_required() {
        let cfg = LeadscoutFileConfig {
            llm_api_key: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_llm_api_key(), Some(String::new()));
    }
}
