//! Dispatcher (C4): fans a keyword set out to every enabled adapter
//! concurrently, collecting `RawHit`s without letting one bad adapter fail
//! the others.
//!
//! Grounded on the teacher's `tools/search/mod.rs::search()`, which runs all
//! engines concurrently via `futures::future::join_all` and collects
//! `Vec<Vec<SearchResult>>`, never short-circuiting on one engine's error.

use futures::future::join_all;
use tracing::info;
use url::Url;

use crate::adapters::industry_site::generic_link_scan;
use crate::adapters::SourceAdapter;
use crate::core::types::{Config, RawHit};
use crate::health_monitor::HealthMonitor;
use crate::progress_bus::ProgressBus;

/// A small, fixed set of permissive HTML search endpoints used only by the
/// zero-hit fallback strategy (§4.4 step 5).
const FALLBACK_SEARCH_ENDPOINTS: &[&str] = &[
    "https://duckduckgo.com/html/?q=",
    "https://www.bing.com/search?q=",
];

pub async fn dispatch(
    config: &Config,
    adapters: &[Box<dyn SourceAdapter>],
    health: &HealthMonitor,
    progress: &ProgressBus,
    job_id: &str,
) -> Vec<RawHit> {
    let enabled_count = adapters.len().max(1);
    let quota = (config.max_results_per_run / enabled_count).max(5);
    let total = adapters.len() as u64;

    progress
        .publish(job_id, "scraping", 0, total.max(1), "dispatching adapters")
        .await;

    let futures = adapters.iter().map(|adapter| {
        let keywords = config.keywords.clone();
        async move {
            let hits = adapter.search(&keywords, quota, health).await;
            (adapter.name().to_string(), hits)
        }
    });

    let results = join_all(futures).await;

    let mut all_hits = Vec::new();
    for (i, (name, hits)) in results.into_iter().enumerate() {
        info!(adapter = name, count = hits.len(), "adapter completed");
        all_hits.extend(hits);
        progress
            .publish(
                job_id,
                "scraping",
                (i + 1) as u64,
                total.max(1),
                &format!("{name} completed"),
            )
            .await;
    }

    if all_hits.is_empty() {
        all_hits = fallback_search(config, health).await;
    }

    all_hits
}

/// Best-effort fallback when every adapter returns zero hits: a simplified
/// query against the most permissive HTML endpoints, accepting any
/// sufficiently link-shaped anchor rather than a provider-specific selector.
async fn fallback_search(config: &Config, health: &HealthMonitor) -> Vec<RawHit> {
    let client = reqwest::Client::new();
    let query: String = url::form_urlencoded::byte_serialize(config.keywords.join(" ").as_bytes()).collect();

    let mut out = Vec::new();
    for endpoint in FALLBACK_SEARCH_ENDPOINTS {
        let url_str = format!("{endpoint}{query}");
        let Ok(origin) = Url::parse(&url_str) else {
            continue;
        };

        let start = std::time::Instant::now();
        let Ok(resp) = client.get(&url_str).send().await else {
            health.record_failure("fallback_search", "request failed").await;
            continue;
        };
        let Ok(body) = resp.text().await else {
            continue;
        };
        health
            .record_success("fallback_search", start.elapsed().as_millis() as u64)
            .await;

        for (title, href) in generic_link_scan(&body, &origin, 10) {
            out.push(RawHit {
                title,
                url: href,
                snippet: String::new(),
                source: "fallback_search".to_string(),
                published_date: chrono::Utc::now(),
                engine: "fallback_search".to_string(),
                url_verified: true,
                author: None,
                image_url: None,
                api_source: None,
            });
        }

        if !out.is_empty() {
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    #[test]
    fn quota_has_a_floor_of_five() {
        let enabled = 20usize;
        let max_results = 10usize;
        let quota = (max_results / enabled.max(1)).max(5);
        assert_eq!(quota, 5);
    }
}
