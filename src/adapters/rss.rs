//! RSS/Atom feed adapter, grounded on `feed-rs` (the same crate
//! `fourthplaces-rootsignal`'s scout/archive binaries use for feed ingestion).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use super::{matches_relevance, SourceAdapter};
use crate::core::types::RawHit;
use crate::health_monitor::HealthMonitor;
use crate::http_client::HttpClient;

/// A small, fixed set of industry RSS feeds. A real deployment would load
/// this list from the config store; kept inline here since feed discovery
/// is outside this core's scope (§1).
const FEEDS: &[(&str, &str)] = &[
    ("Industry Wire", "https://example-industry-wire.test/rss"),
    ("Local Business Journal", "https://example-biz-journal.test/feed"),
];

pub struct RssAdapter {
    http: Arc<HttpClient>,
}

impl RssAdapter {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    fn name(&self) -> &str {
        "rss"
    }

    async fn search(&self, keywords: &[String], max_results: usize, health: &HealthMonitor) -> Vec<RawHit> {
        let mut out = Vec::new();

        for (source_name, feed_url) in FEEDS {
            if out.len() >= max_results {
                break;
            }

            let start = std::time::Instant::now();
            let body = match self.http.get_text(feed_url, self.name(), health).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(feed = *feed_url, error = %e, "rss feed fetch failed");
                    health.record_failure(self.name(), &e.to_string()).await;
                    continue;
                }
            };
            health
                .record_success(self.name(), start.elapsed().as_millis() as u64)
                .await;

            let feed = match feed_rs::parser::parse(body.as_bytes()) {
                Ok(f) => f,
                Err(e) => {
                    warn!(feed = *feed_url, error = %e, "rss feed parse failed");
                    health.record_failure(self.name(), &e.to_string()).await;
                    continue;
                }
            };

            for entry in feed.entries {
                if out.len() >= max_results {
                    break;
                }

                let title = entry
                    .title
                    .map(|t| t.content)
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                if title.len() < 5 {
                    continue;
                }

                let snippet = entry
                    .summary
                    .map(|s| s.content)
                    .unwrap_or_default();

                if !matches_relevance(&format!("{title} {snippet}"), keywords) {
                    debug!(title, "rss entry filtered by relevance");
                    continue;
                }

                let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
                    continue;
                };

                let published_date = entry
                    .published
                    .or(entry.updated)
                    .unwrap_or_else(Utc::now);

                out.push(RawHit {
                    title,
                    url: link,
                    snippet,
                    source: source_name.to_string(),
                    published_date,
                    engine: "rss".to_string(),
                    url_verified: true,
                    author: entry.authors.first().map(|a| a.name.clone()),
                    image_url: None,
                    api_source: None,
                });
            }
        }

        out
    }
}
