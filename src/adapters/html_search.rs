//! CSS-selector-table-driven HTML search-engine scraping (Google SERP, Bing
//! News, DuckDuckGo, Yahoo/MSN/AOL). Grounded on the teacher's
//! `tools/search/engines/duckduckgo.rs`: build a provider search URL, GET
//! it, parse with `scraper`, unwrap redirect links, resolve relative hrefs.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

use super::{matches_relevance, SourceAdapter};
use crate::core::types::RawHit;
use crate::health_monitor::HealthMonitor;
use crate::http_client::HttpClient;

#[derive(Clone, Copy)]
pub struct HtmlSearchSpec {
    pub name: &'static str,
    pub search_url_template: &'static str,
    pub item_selector: &'static str,
    pub link_selector: &'static str,
    pub snippet_selector: &'static str,
    /// When `Some`, hrefs of this form (e.g. Google's `/url?q=<target>&...`)
    /// are unwrapped to their `q` query parameter.
    pub redirect_query_param: Option<&'static str>,
}

const DUCKDUCKGO: HtmlSearchSpec = HtmlSearchSpec {
    name: "duckduckgo",
    search_url_template: "https://duckduckgo.com/html/?q={query}",
    item_selector: "div.results_links",
    link_selector: "a.result__a",
    snippet_selector: "a.result__snippet, div.result__snippet",
    redirect_query_param: Some("uddg"),
};

const BING_NEWS: HtmlSearchSpec = HtmlSearchSpec {
    name: "bing_news_html",
    search_url_template: "https://www.bing.com/news/search?q={query}",
    item_selector: "div.news-card",
    link_selector: "a.title",
    snippet_selector: "div.snippet",
    redirect_query_param: None,
};

pub struct HtmlSearchAdapter {
    http: Arc<HttpClient>,
    spec: HtmlSearchSpec,
}

impl HtmlSearchAdapter {
    pub fn duckduckgo(http: Arc<HttpClient>) -> Self {
        Self { http, spec: DUCKDUCKGO }
    }

    pub fn bing_news(http: Arc<HttpClient>) -> Self {
        Self { http, spec: BING_NEWS }
    }

    fn build_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.spec.search_url_template.replace("{query}", &encoded)
    }

    fn resolve_href(&self, href: &str, origin: &Url) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        let candidate = origin.join(href).ok()?;

        if let Some(param) = self.spec.redirect_query_param {
            for (k, v) in candidate.query_pairs() {
                if k == param && !v.trim().is_empty() {
                    return Some(v.to_string());
                }
            }
        }

        if candidate.scheme() == "http" || candidate.scheme() == "https" {
            Some(candidate.to_string())
        } else {
            None
        }
    }

    fn parse(&self, html: &str, origin: &Url, keywords: &[String], max_results: usize) -> Vec<RawHit> {
        let doc = Html::parse_document(html);
        let Ok(sel_item) = Selector::parse(self.spec.item_selector) else {
            return Vec::new();
        };
        let Ok(sel_link) = Selector::parse(self.spec.link_selector) else {
            return Vec::new();
        };
        let Ok(sel_snip) = Selector::parse(self.spec.snippet_selector) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for item in doc.select(&sel_item) {
            if out.len() >= max_results {
                break;
            }

            let Some(link) = item.select(&sel_link).next() else {
                continue;
            };
            let href_raw = link.value().attr("href").unwrap_or("");
            let Some(href) = self.resolve_href(href_raw, origin) else {
                continue;
            };

            let title = link.text().collect::<Vec<_>>().join(" ");
            let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
            if title.len() < 5 {
                continue;
            }

            let snippet = item
                .select(&sel_snip)
                .next()
                .map(|n| n.text().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            let snippet = snippet.split_whitespace().collect::<Vec<_>>().join(" ");

            if !matches_relevance(&format!("{title} {snippet}"), keywords) {
                continue;
            }

            out.push(RawHit {
                title,
                url: href,
                snippet,
                source: self.spec.name.to_string(),
                published_date: chrono::Utc::now(),
                engine: self.spec.name.to_string(),
                url_verified: true,
                author: None,
                image_url: None,
                api_source: None,
            });
        }
        out
    }
}

#[async_trait]
impl SourceAdapter for HtmlSearchAdapter {
    fn name(&self) -> &str {
        self.spec.name
    }

    async fn search(&self, keywords: &[String], max_results: usize, health: &HealthMonitor) -> Vec<RawHit> {
        let query = keywords.join(" ");
        let url_str = self.build_url(&query);
        let Ok(origin) = Url::parse(&url_str) else {
            return Vec::new();
        };

        let start = std::time::Instant::now();
        match self.http.get_text(&url_str, self.name(), health).await {
            Ok(body) => {
                health
                    .record_success(self.name(), start.elapsed().as_millis() as u64)
                    .await;
                self.parse(&body, &origin, keywords, max_results)
            }
            Err(e) => {
                warn!(provider = self.spec.name, error = %e, "html search request failed");
                health.record_failure(self.name(), &e.to_string()).await;
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> HtmlSearchAdapter {
        HtmlSearchAdapter {
            http: Arc::new(
                HttpClient::new(&crate::core::config::LeadscoutFileConfig::default().into_runtime()).unwrap(),
            ),
            spec: DUCKDUCKGO,
        }
    }

    #[test]
    fn unwraps_duckduckgo_redirect_link() {
        let a = adapter();
        let origin = Url::parse("https://duckduckgo.com/html/?q=hotel").unwrap();
        let resolved = a
            .resolve_href("//duckduckgo.com/l/?uddg=https%3A%2F%2Fsite.tld%2Fa&rut=1", &origin)
            .unwrap();
        assert_eq!(resolved, "https://site.tld/a");
    }

    #[test]
    fn resolves_relative_href_against_origin() {
        let a = adapter();
        let origin = Url::parse("https://example.com/search").unwrap();
        let resolved = a.resolve_href("/articles/a", &origin).unwrap();
        assert_eq!(resolved, "https://example.com/articles/a");
    }

    #[test]
    fn parses_basic_result_markup() {
        let a = adapter();
        let html = r#"
            <div class="results_links">
                <a class="result__a" href="https://example.com/hotel-opens">Hotel Opens Downtown</a>
                <div class="result__snippet">A new hotel announces opening</div>
            </div>
        "#;
        let origin = Url::parse("https://duckduckgo.com/html/").unwrap();
        let hits = a.parse(html, &origin, &["hotel".to_string()], 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://example.com/hotel-opens");
    }
}
