//! Health Monitor (C9): per-engine status, a bounded FIFO error ring, and
//! recovery recommendations.
//!
//! Grounded on the teacher's `features/proxy_manager.rs::ProxyManager`:
//! shared `Arc<RwLock<_>>` state, per-target failure counters, "disable
//! after N failures" logic — generalized here from per-proxy to per-engine
//! and paired with spec §4.9's classified-error ring instead of a plain
//! failure counter.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::http_client::HttpClient;

/// Synthetic probe targets hit every 30s by `run_health_check` to prove
/// outbound connectivity independent of any real job running.
const PROBE_URLS: [&str; 2] = ["https://www.google.com", "https://www.bing.com"];
const PROBE_ENGINE: &str = "probe";
const PROBE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Timeout,
    NotFound,
    Blocked,
    Other,
}

impl ErrorClass {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") {
            ErrorClass::Timeout
        } else if lower.contains("404") || lower.contains("not found") {
            ErrorClass::NotFound
        } else if lower.contains("blocked") || lower.contains("403") || lower.contains("429") || lower.contains("captcha") {
            ErrorClass::Blocked
        } else {
            ErrorClass::Other
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub engine: String,
    pub message: String,
    pub class: ErrorClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatusKind {
    Success,
    Failed,
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub status: EngineStatusKind,
    pub total_requests: u64,
    pub success: u64,
    pub failed: u64,
    pub avg_latency_ms: f64,
    pub last_error: Option<String>,
    /// Set when the most recent failure classified as `Blocked`, cleared on
    /// the next success. Drives UA pool-rotation (§4.1): a stable UA is used
    /// until the engine trips this, then the client starts rotating.
    pub blocked: bool,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            status: EngineStatusKind::Success,
            total_requests: 0,
            success: 0,
            failed: 0,
            avg_latency_ms: 0.0,
            last_error: None,
            blocked: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub engines: HashMap<String, EngineStatus>,
    pub success_rate: f64,
    pub recommendations: Vec<String>,
}

struct Inner {
    engines: HashMap<String, EngineStatus>,
    errors: VecDeque<ErrorEntry>,
    max_failures_before_disable: u32,
    ring_capacity: usize,
    last_reset_day: NaiveDate,
}

impl Inner {
    /// Spec §4.9's daily counter reset: the first access on a new UTC day
    /// wipes every engine's running counters and the error ring, giving
    /// engines disabled the previous day a clean slate.
    fn maybe_reset_daily(&mut self) {
        let today = chrono::Utc::now().date_naive();
        if today == self.last_reset_day {
            return;
        }
        self.last_reset_day = today;
        self.engines.clear();
        self.errors.clear();
    }
}

pub struct HealthMonitor {
    inner: Arc<RwLock<Inner>>,
}

impl HealthMonitor {
    pub fn new(max_failures_before_disable: u32, ring_capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                engines: HashMap::new(),
                errors: VecDeque::new(),
                max_failures_before_disable,
                ring_capacity,
                last_reset_day: chrono::Utc::now().date_naive(),
            })),
        }
    }

    pub async fn record_success(&self, engine: &str, latency_ms: u64) {
        let mut inner = self.inner.write().await;
        inner.maybe_reset_daily();
        let entry = inner.engines.entry(engine.to_string()).or_default();
        entry.total_requests += 1;
        entry.success += 1;
        entry.blocked = false;
        if entry.status != EngineStatusKind::Disabled {
            entry.status = EngineStatusKind::Success;
        }
        entry.avg_latency_ms =
            (entry.avg_latency_ms * (entry.success - 1) as f64 + latency_ms as f64) / entry.success as f64;
    }

    pub async fn record_failure(&self, engine: &str, message: &str) {
        let class = ErrorClass::classify(message);
        let mut inner = self.inner.write().await;
        inner.maybe_reset_daily();

        let ring_capacity = inner.ring_capacity;
        if inner.errors.len() >= ring_capacity {
            inner.errors.pop_front();
        }
        inner.errors.push_back(ErrorEntry {
            engine: engine.to_string(),
            message: message.to_string(),
            class,
        });

        let max_failures = inner.max_failures_before_disable;
        let entry = inner.engines.entry(engine.to_string()).or_default();
        entry.total_requests += 1;
        entry.failed += 1;
        entry.last_error = Some(message.to_string());
        if class == ErrorClass::Blocked {
            entry.blocked = true;
        }

        if entry.failed >= max_failures as u64 {
            entry.status = EngineStatusKind::Disabled;
            warn!(engine, failures = entry.failed, "engine disabled after repeated failures");
        } else {
            entry.status = EngineStatusKind::Failed;
        }
    }

    /// Whether `engine` should rotate its UA from the pool (§4.1): true once
    /// its most recent failure looked like a block, reset on next success.
    pub async fn is_blocked(&self, engine: &str) -> bool {
        self.inner
            .read()
            .await
            .engines
            .get(engine)
            .map(|e| e.blocked)
            .unwrap_or(false)
    }

    pub async fn get_health_report(&self) -> HealthReport {
        let inner = self.inner.read().await;
        let total: u64 = inner.engines.values().map(|e| e.total_requests).sum();
        let success: u64 = inner.engines.values().map(|e| e.success).sum();
        let success_rate = if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        };

        let mut class_counts: HashMap<ErrorClass, usize> = HashMap::new();
        for e in &inner.errors {
            *class_counts.entry(e.class).or_insert(0) += 1;
        }

        let mut recommendations = Vec::new();
        if class_counts.get(&ErrorClass::Blocked).copied().unwrap_or(0) > 0 {
            recommendations.push("rotate UA".to_string());
        }
        if class_counts.get(&ErrorClass::Timeout).copied().unwrap_or(0) > 0 {
            recommendations.push("increase timeout".to_string());
        }
        if class_counts.get(&ErrorClass::NotFound).copied().unwrap_or(0) > 0 {
            recommendations.push("review URL generation".to_string());
        }

        HealthReport {
            engines: inner.engines.clone(),
            success_rate,
            recommendations,
        }
    }

    /// Re-enables any engine whose failure streak predates this call,
    /// returning the list of actions taken. Mirrors spec §6's
    /// `attemptRecovery()`.
    pub async fn attempt_recovery(&self) -> Vec<String> {
        let mut inner = self.inner.write().await;
        let max_failures = inner.max_failures_before_disable;
        let mut actions = Vec::new();
        for (name, status) in inner.engines.iter_mut() {
            if status.status == EngineStatusKind::Disabled {
                status.status = EngineStatusKind::Success;
                status.failed = 0;
                actions.push(format!("re-enabled {name} (was disabled after {max_failures} failures)"));
            }
        }
        actions
    }

    pub async fn engine_status(&self, engine: &str) -> Option<EngineStatus> {
        self.inner.read().await.engines.get(engine).cloned()
    }

    /// Spec §6 `getEngineStatus()`: the full per-engine status map, as
    /// opposed to `engine_status`'s single-engine lookup.
    pub async fn get_engine_status(&self) -> HashMap<String, EngineStatus> {
        self.inner.read().await.engines.clone()
    }

    /// Spec §6 `getErrorRecovery()`: alias of `attempt_recovery` under the
    /// spec's own name.
    pub async fn get_error_recovery(&self) -> Vec<String> {
        self.attempt_recovery().await
    }

    /// Spec §6 `runHealthCheck()` / §4.9's synthetic probe: GET two
    /// known-good URLs, record the outcome against the `probe` pseudo-engine,
    /// then return the current report.
    pub async fn run_health_check(&self, http: &HttpClient) -> HealthReport {
        for url in PROBE_URLS {
            let start = std::time::Instant::now();
            match http.get_text(url, PROBE_ENGINE, self).await {
                Ok(_) => self.record_success(PROBE_ENGINE, start.elapsed().as_millis() as u64).await,
                Err(e) => self.record_failure(PROBE_ENGINE, &e.to_string()).await,
            }
        }
        self.get_health_report().await
    }

    /// Spawns the background task that calls `run_health_check` every 30s
    /// for the life of the returned handle.
    pub fn spawn_probe_loop(self: Arc<Self>, http: Arc<HttpClient>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PROBE_INTERVAL);
            loop {
                interval.tick().await;
                self.run_health_check(&http).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disables_engine_after_max_failures() {
        let monitor = HealthMonitor::new(2, 50);
        monitor.record_failure("google", "403 forbidden").await;
        monitor.record_failure("google", "403 forbidden").await;
        let status = monitor.engine_status("google").await.unwrap();
        assert_eq!(status.status, EngineStatusKind::Disabled);
    }

    #[tokio::test]
    async fn ring_is_bounded() {
        let monitor = HealthMonitor::new(1000, 3);
        for i in 0..10 {
            monitor.record_failure("x", &format!("error {i}")).await;
        }
        let inner = monitor.inner.read().await;
        assert_eq!(inner.errors.len(), 3);
    }

    #[tokio::test]
    async fn success_rate_in_bounds() {
        let monitor = HealthMonitor::new(5, 50);
        monitor.record_success("rss", 100).await;
        monitor.record_failure("rss", "timeout").await;
        let report = monitor.get_health_report().await;
        assert!(report.success_rate >= 0.0 && report.success_rate <= 100.0);
    }

    #[tokio::test]
    async fn recovery_reenables_disabled_engine() {
        let monitor = HealthMonitor::new(1, 50);
        monitor.record_failure("bing", "blocked").await;
        let actions = monitor.attempt_recovery().await;
        assert_eq!(actions.len(), 1);
        let status = monitor.engine_status("bing").await.unwrap();
        assert_eq!(status.status, EngineStatusKind::Success);
    }
}
