//! Shared HTTP client: UA rotation, stealth headers, and bounded retry with
//! exponential backoff (C1).
//!
//! Grounded on the teacher's scrape-tool retry block: a `reqwest::Client`
//! wrapped by `backoff::future::retry`, `ExponentialBackoffBuilder` tuned to
//! a short initial interval and a hard elapsed-time cap so a blocked engine
//! fails fast instead of hanging a whole job.

use std::time::Duration;

use backoff::future::retry;
use backoff::{Error as BackoffError, ExponentialBackoffBuilder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::antibot::{get_default_user_agent, get_random_user_agent, get_stealth_headers};
use crate::core::RuntimeConfig;
use crate::health_monitor::HealthMonitor;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("blocked: {reason}")]
    Blocked { reason: String },
    #[error("transient: {0}")]
    Transient(String),
    #[error("fatal: {0}")]
    Fatal(String),
}

impl AdapterError {
    /// A blocked response (403/429/challenge page) is never retried — spec
    /// requires the adapter return empty rather than hammer a provider that
    /// just flagged us. Only genuinely transient failures retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Transient(_))
    }
}

/// Cheap heuristic classifier for why a fetch might be coming back blocked,
/// mirroring the teacher's `detect_block_reason`.
fn detect_block_reason(status: reqwest::StatusCode, body: &str) -> Option<String> {
    if status.as_u16() == 403 || status.as_u16() == 429 {
        return Some(format!("http status {}", status));
    }
    let lower = body.to_ascii_lowercase();
    if lower.contains("captcha") || lower.contains("are you a robot") || lower.contains("access denied") {
        return Some("challenge page detected".to_string());
    }
    None
}

#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    max_retries: u32,
    retry_max_elapsed: Duration,
}

impl HttpClient {
    pub fn new(cfg: &RuntimeConfig) -> Result<Self, AdapterError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.http_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Ok(key) = std::env::var("SCRAPY_CLOUD_API_KEY") {
            if !key.trim().is_empty() {
                let proxy_url = format!("http://{key}:@proxy.zyte.com:8011");
                let proxy = reqwest::Proxy::all(&proxy_url)
                    .map_err(|e| AdapterError::Fatal(format!("invalid scrapy cloud proxy: {e}")))?;
                builder = builder.proxy(proxy);
            }
        }

        let inner = builder
            .build()
            .map_err(|e| AdapterError::Fatal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            inner,
            max_retries: cfg.http_max_retries,
            retry_max_elapsed: Duration::from_millis(cfg.http_retry_max_elapsed_ms),
        })
    }

    /// GET `url` on behalf of `engine`, retrying transient failures up to
    /// `max_retries` attempts capped by `retry_max_elapsed`. A blocked
    /// response is never retried. The User-Agent stays stable unless `health`
    /// reports `engine` was previously blocked, in which case each attempt
    /// rotates through the UA pool (§4.1).
    pub async fn get_text(&self, url: &str, engine: &str, health: &HealthMonitor) -> Result<String, AdapterError> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(Some(self.retry_max_elapsed))
            .build();

        let attempts = std::sync::atomic::AtomicU32::new(0);

        retry(backoff, || async {
            let n = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n >= self.max_retries {
                return Err(BackoffError::permanent(AdapterError::Transient(
                    "max retries exhausted".to_string(),
                )));
            }
            let rotate = health.is_blocked(engine).await;
            self.fetch_once(url, rotate).await.map_err(|e| {
                if e.is_retryable() {
                    debug!(url, attempt = n, "retrying after {}", e);
                    BackoffError::transient(e)
                } else {
                    BackoffError::permanent(e)
                }
            })
        })
        .await
    }

    async fn fetch_once(&self, url: &str, rotate_ua: bool) -> Result<String, AdapterError> {
        let ua = if rotate_ua {
            get_random_user_agent().to_string()
        } else {
            get_default_user_agent()
        };
        let mut req = self.inner.get(url).header("User-Agent", ua);
        for (k, v) in get_stealth_headers() {
            req = req.header(k, v);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                AdapterError::Transient(e.to_string())
            } else {
                AdapterError::Fatal(e.to_string())
            }
        })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AdapterError::Transient(e.to_string()))?;

        if let Some(reason) = detect_block_reason(status, &body) {
            warn!(url, reason, "adapter request blocked");
            return Err(AdapterError::Blocked { reason });
        }

        if !status.is_success() {
            return Err(AdapterError::Transient(format!("http status {status}")));
        }

        Ok(body)
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_status_is_not_retryable() {
        let e = AdapterError::Blocked { reason: "403".into() };
        assert!(!e.is_retryable());
    }

    #[test]
    fn fatal_is_not_retryable() {
        let e = AdapterError::Fatal("bad url".into());
        assert!(!e.is_retryable());
    }

    #[test]
    fn detects_captcha_page() {
        assert!(detect_block_reason(reqwest::StatusCode::OK, "please solve this captcha").is_some());
    }
}
