//! Generic, data-table-driven adapter for every authenticated JSON API
//! provider (News-API, Bing-News-API, Google-CSE, Crunchbase, BusinessWire,
//! SEC-EDGAR, Yelp). Rather than one hand-written adapter per provider, a
//! small `KeyedApiSpec` table describes the URL template, the env var that
//! gates it, and the JSON shape of its response — this is the data-table
//! seat of Design Notes §9 ("selector lists as data tables, not code")
//! applied to the keyed-API side of C3.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use super::SourceAdapter;
use crate::core::types::RawHit;
use crate::health_monitor::HealthMonitor;
use crate::http_client::HttpClient;

#[derive(Clone, Copy)]
pub struct KeyedApiSpec {
    pub name: &'static str,
    pub env_key_var: &'static str,
    /// `{key}` and `{query}` are substituted (both percent-encoded). `{cx}`
    /// is substituted too when `extra_id_env_var` is set.
    pub url_template: &'static str,
    /// Dotted path to the results array, e.g. `"articles"` or `"response.docs"`.
    pub results_path: &'static str,
    pub title_field: &'static str,
    pub url_field: &'static str,
    pub snippet_field: &'static str,
    pub date_field: Option<&'static str>,
    /// Second required env var some providers need alongside the API key —
    /// e.g. Google CSE's search-engine id (`GOOGLE_CSE_ID`). Adapter
    /// construction fails closed (returns `None`) when this is set but the
    /// env var is unset.
    pub extra_id_env_var: Option<&'static str>,
}

pub fn default_specs() -> Vec<KeyedApiSpec> {
    vec![
        KeyedApiSpec {
            name: "news_api",
            env_key_var: "NEWS_API_KEY",
            url_template: "https://newsapi.org/v2/everything?q={query}&apiKey={key}",
            results_path: "articles",
            title_field: "title",
            url_field: "url",
            snippet_field: "description",
            date_field: Some("publishedAt"),
            extra_id_env_var: None,
        },
        KeyedApiSpec {
            name: "bing_news",
            env_key_var: "BING_NEWS_KEY",
            url_template: "https://api.bing.microsoft.com/v7.0/news/search?q={query}&key={key}",
            results_path: "value",
            title_field: "name",
            url_field: "url",
            snippet_field: "description",
            date_field: Some("datePublished"),
            extra_id_env_var: None,
        },
        KeyedApiSpec {
            name: "google_cse",
            env_key_var: "GOOGLE_CSE_KEY",
            url_template: "https://www.googleapis.com/customsearch/v1?q={query}&key={key}&cx={cx}",
            results_path: "items",
            title_field: "title",
            url_field: "link",
            snippet_field: "snippet",
            date_field: None,
            extra_id_env_var: Some("GOOGLE_CSE_ID"),
        },
        KeyedApiSpec {
            name: "crunchbase",
            env_key_var: "CRUNCHBASE_KEY",
            url_template: "https://api.crunchbase.com/api/v4/searches/organizations?query={query}&user_key={key}",
            results_path: "entities",
            title_field: "name",
            url_field: "permalink",
            snippet_field: "short_description",
            date_field: None,
            extra_id_env_var: None,
        },
        KeyedApiSpec {
            name: "business_wire",
            env_key_var: "BUSINESS_WIRE_KEY",
            url_template: "https://newsroom.businesswire.com/api/search?q={query}&apikey={key}",
            results_path: "results",
            title_field: "headline",
            url_field: "url",
            snippet_field: "summary",
            date_field: Some("date"),
            extra_id_env_var: None,
        },
        KeyedApiSpec {
            name: "sec_edgar",
            env_key_var: "SEC_EDGAR_KEY",
            url_template: "https://efts.sec.gov/LATEST/search-index?q={query}&apikey={key}",
            results_path: "hits.hits",
            title_field: "display_names",
            url_field: "_id",
            snippet_field: "_source.description",
            date_field: Some("_source.file_date"),
            extra_id_env_var: None,
        },
        KeyedApiSpec {
            name: "yelp",
            env_key_var: "YELP_KEY",
            url_template: "https://api.yelp.com/v3/businesses/search?term={query}&apikey={key}",
            results_path: "businesses",
            title_field: "name",
            url_field: "url",
            snippet_field: "categories",
            date_field: None,
            extra_id_env_var: None,
        },
    ]
}

fn dotted_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

fn field_as_string(item: &Value, field: &str) -> Option<String> {
    let v = dotted_get(item, field)?;
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Array(a) => Some(
            a.iter()
                .filter_map(|x| x.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

pub struct KeyedApiAdapter {
    http: Arc<HttpClient>,
    spec: KeyedApiSpec,
    api_key: String,
    extra_id: Option<String>,
}

impl KeyedApiAdapter {
    /// Returns `None` (adapter disabled) when `spec.env_key_var`, or the
    /// provider's `extra_id_env_var` if it has one, is unset — the
    /// dispatcher is expected to skip silently per §4.3.
    pub fn from_env(http: Arc<HttpClient>, spec: KeyedApiSpec) -> Option<Self> {
        let api_key = std::env::var(spec.env_key_var)
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        let extra_id = match spec.extra_id_env_var {
            Some(var) => Some(std::env::var(var).ok().filter(|v| !v.trim().is_empty())?),
            None => None,
        };
        Some(Self {
            http,
            spec,
            api_key,
            extra_id,
        })
    }

    fn build_url(&self, query: &str) -> String {
        let encoded_query = urlencode(query);
        let url = self
            .spec
            .url_template
            .replace("{query}", &encoded_query)
            .replace("{key}", &urlencode(&self.api_key));
        match &self.extra_id {
            Some(id) => url.replace("{cx}", &urlencode(id)),
            None => url,
        }
    }

    fn parse(&self, body: &str, max_results: usize) -> Vec<RawHit> {
        let Ok(root) = serde_json::from_str::<Value>(body) else {
            return Vec::new();
        };
        let Some(items) = dotted_get(&root, self.spec.results_path).and_then(|v| v.as_array()) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for item in items {
            if out.len() >= max_results {
                break;
            }
            let Some(title) = field_as_string(item, self.spec.title_field) else {
                continue;
            };
            let title = title.trim().to_string();
            if title.len() < 5 {
                continue;
            }
            let Some(url) = field_as_string(item, self.spec.url_field) else {
                continue;
            };
            let snippet = field_as_string(item, self.spec.snippet_field).unwrap_or_default();
            let published_date = self
                .spec
                .date_field
                .and_then(|f| field_as_string(item, f))
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);

            out.push(RawHit {
                title,
                url,
                snippet,
                source: self.spec.name.to_string(),
                published_date,
                engine: self.spec.name.to_string(),
                url_verified: true,
                author: None,
                image_url: None,
                api_source: Some(self.spec.name.to_string()),
            });
        }
        out
    }
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[async_trait]
impl SourceAdapter for KeyedApiAdapter {
    fn name(&self) -> &str {
        self.spec.name
    }

    async fn search(&self, keywords: &[String], max_results: usize, health: &HealthMonitor) -> Vec<RawHit> {
        let query = keywords.join(" ");
        let url = self.build_url(&query);

        let start = std::time::Instant::now();
        match self.http.get_text(&url, self.name(), health).await {
            Ok(body) => {
                health
                    .record_success(self.name(), start.elapsed().as_millis() as u64)
                    .await;
                self.parse(&body, max_results)
            }
            Err(e) => {
                warn!(provider = self.spec.name, error = %e, "keyed api request failed");
                health.record_failure(self.name(), &e.to_string()).await;
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_news_api_shaped_response() {
        let spec = default_specs()[0];
        let adapter = KeyedApiAdapter {
            http: Arc::new(HttpClient::new(&crate::core::config::LeadscoutFileConfig::default().into_runtime()).unwrap()),
            spec,
            api_key: "k".to_string(),
            extra_id: None,
        };
        let body = r#"{"articles":[{"title":"Hotel Opens Downtown","url":"https://e.test/a","description":"desc","publishedAt":"2026-01-01T00:00:00Z"}]}"#;
        let hits = adapter.parse(body, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Hotel Opens Downtown");
    }

    #[test]
    fn url_template_substitutes_key_and_query() {
        let spec = default_specs()[0];
        let adapter = KeyedApiAdapter {
            http: Arc::new(HttpClient::new(&crate::core::config::LeadscoutFileConfig::default().into_runtime()).unwrap()),
            spec,
            api_key: "secret".to_string(),
            extra_id: None,
        };
        let url = adapter.build_url("hotel openings");
        assert!(url.contains("apiKey=secret"));
        assert!(url.contains("hotel"));
    }

    #[test]
    fn google_cse_url_substitutes_search_engine_id() {
        let spec = default_specs().into_iter().find(|s| s.name == "google_cse").unwrap();
        let adapter = KeyedApiAdapter {
            http: Arc::new(HttpClient::new(&crate::core::config::LeadscoutFileConfig::default().into_runtime()).unwrap()),
            spec,
            api_key: "secret".to_string(),
            extra_id: Some("cse123".to_string()),
        };
        let url = adapter.build_url("hotel openings");
        assert!(url.contains("cx=cse123"));
    }
}
