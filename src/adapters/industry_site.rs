//! Direct industry-site scrape: fetch a fixed list of named industry sites
//! and scan for candidate article links, independent of any search-engine
//! chrome. Also exposes `generic_link_scan`, the same "accept any
//! sufficiently link-shaped anchor" heuristic the dispatcher's fallback
//! search strategy (§4.4 step 5) reuses against the permissive HTML
//! adapters.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use super::{matches_relevance, SourceAdapter};
use crate::core::types::RawHit;
use crate::health_monitor::HealthMonitor;
use crate::http_client::HttpClient;
use crate::url_validator::is_article_url;

const INDUSTRY_SITES: &[(&str, &str)] = &[
    ("Hospitality Net", "https://example-hospitality-net.test/"),
    ("Commercial Observer", "https://example-commercial-observer.test/"),
];

/// Accept any anchor whose visible text is 10..200 chars and whose resolved
/// href passes the article-URL validator — used both here and by the
/// dispatcher's zero-hit fallback.
pub fn generic_link_scan(html: &str, origin: &Url, max_results: usize) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    let Ok(sel_a) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for a in doc.select(&sel_a) {
        if out.len() >= max_results {
            break;
        }
        let text = a.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.len() < 10 || text.len() > 200 {
            continue;
        }
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = origin.join(href) else {
            continue;
        };
        let resolved = resolved.to_string();
        if !is_article_url(&resolved) {
            continue;
        }
        out.push((text, resolved));
    }
    out
}

pub struct IndustrySiteAdapter {
    http: Arc<HttpClient>,
}

impl IndustrySiteAdapter {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SourceAdapter for IndustrySiteAdapter {
    fn name(&self) -> &str {
        "industry_site"
    }

    async fn search(&self, keywords: &[String], max_results: usize, health: &HealthMonitor) -> Vec<RawHit> {
        let mut out = Vec::new();

        for (source_name, site_url) in INDUSTRY_SITES {
            if out.len() >= max_results {
                break;
            }
            let Ok(origin) = Url::parse(site_url) else {
                continue;
            };
            let start = std::time::Instant::now();
            let body = match self.http.get_text(site_url, self.name(), health).await {
                Ok(b) => {
                    health
                        .record_success(self.name(), start.elapsed().as_millis() as u64)
                        .await;
                    b
                }
                Err(e) => {
                    health.record_failure(self.name(), &e.to_string()).await;
                    continue;
                }
            };

            for (title, href) in generic_link_scan(&body, &origin, max_results - out.len()) {
                if !matches_relevance(&title, keywords) {
                    continue;
                }
                out.push(RawHit {
                    title,
                    url: href,
                    snippet: String::new(),
                    source: source_name.to_string(),
                    published_date: chrono::Utc::now(),
                    engine: "industry_site".to_string(),
                    url_verified: true,
                    author: None,
                    image_url: None,
                    api_source: None,
                });
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_accepts_article_shaped_anchors() {
        let html = r#"<a href="/articles/hotel-opens">Hotel X Opens Its Doors Downtown Today</a>"#;
        let origin = Url::parse("https://example.com/").unwrap();
        let found = generic_link_scan(html, &origin, 10);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn scan_rejects_short_link_text() {
        let html = r#"<a href="/a">Home</a>"#;
        let origin = Url::parse("https://example.com/").unwrap();
        let found = generic_link_scan(html, &origin, 10);
        assert!(found.is_empty());
    }
}
