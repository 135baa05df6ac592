//! Source adapters (C3): one per provider family, all converging on
//! `RawHit` through the `SourceAdapter` capability (Design Notes §9 —
//! composition over inheritance).

pub mod html_search;
pub mod industry_site;
pub mod keyed_api;
pub mod rss;

use async_trait::async_trait;

use crate::core::types::RawHit;
use crate::health_monitor::HealthMonitor;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Never propagates an error: on any failure, returns an empty list,
    /// having already recorded the failure with `health` (§4.3).
    async fn search(&self, keywords: &[String], max_results: usize, health: &HealthMonitor) -> Vec<RawHit>;
}

/// Generic business terms used by the relevance filter inside HTML-search
/// and RSS adapters, accepted in place of an explicit keyword match.
pub const GENERIC_BUSINESS_TERMS: &[&str] = &[
    "announces", "opens", "launches", "expands", "development", "project", "investment",
    "company", "business",
];

pub fn matches_relevance(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_ascii_lowercase();
    if keywords
        .iter()
        .any(|k| lower.contains(&k.to_ascii_lowercase()))
    {
        return true;
    }
    GENERIC_BUSINESS_TERMS.iter().any(|t| lower.contains(t))
}

/// Builds the default adapter set, or the config-restricted subset when
/// `Config.sources` is present. API-keyed adapters silently omit themselves
/// when their env var is absent (§6).
pub fn build_adapters(
    http: std::sync::Arc<crate::http_client::HttpClient>,
    sources: Option<&[String]>,
) -> Vec<Box<dyn SourceAdapter>> {
    let mut all: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(rss::RssAdapter::new(http.clone())),
        Box::new(html_search::HtmlSearchAdapter::duckduckgo(http.clone())),
        Box::new(html_search::HtmlSearchAdapter::bing_news(http.clone())),
        Box::new(industry_site::IndustrySiteAdapter::new(http.clone())),
    ];

    for spec in keyed_api::default_specs() {
        if let Some(adapter) = keyed_api::KeyedApiAdapter::from_env(http.clone(), spec) {
            all.push(Box::new(adapter));
        }
    }

    match sources {
        None => all,
        Some(names) => all
            .into_iter()
            .filter(|a| names.iter().any(|n| n.eq_ignore_ascii_case(a.name())))
            .collect(),
    }
}
