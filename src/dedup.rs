//! Deduplicator (C5): collapses `RawHit`s by normalized-URL + title, with a
//! same-host title-similarity fallback.

use std::collections::HashSet;

use crate::core::types::RawHit;
use crate::url_validator::{extract_domain, is_article_url, normalize, synthesize_fallback};

/// Shared with the per-user duplicate fallback in `persister` (§4.8 step 2).
pub(crate) fn tokenize(s: &str) -> HashSet<String> {
    s.to_ascii_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_string())
        .collect()
}

pub(crate) fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Ensure every hit has a valid, normalized URL, synthesizing a fallback
/// (and marking `url_verified=false`) when the original fails validation.
pub fn ensure_valid_url(mut hit: RawHit) -> RawHit {
    if is_article_url(&hit.url) {
        if let Some(n) = normalize(&hit.url) {
            hit.url = n;
            return hit;
        }
    }
    hit.url = synthesize_fallback(&hit.title, &hit.source);
    hit.url_verified = false;
    hit
}

struct Kept {
    domain: Option<String>,
    path_prefix: String,
    tokens: HashSet<String>,
}

/// Host's first path segment, shared with `persister`'s URL-prefix
/// duplicate fallback (§4.8 step 2).
pub(crate) fn path_prefix(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .map(|u| {
            u.path()
                .split('/')
                .filter(|s| !s.is_empty())
                .take(1)
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

/// Drop duplicate hits. First-seen wins. Two independent checks:
/// 1. exact `(normalized_url, lowercase title)` key
/// 2. same host + same first path segment AND title Jaccard similarity ≥ 0.8
pub fn dedupe_hits(hits: Vec<RawHit>) -> (Vec<RawHit>, usize) {
    let mut kept: Vec<Kept> = Vec::new();
    let mut out: Vec<RawHit> = Vec::new();
    let mut seen_keys: HashSet<(String, String)> = HashSet::new();
    let mut dropped = 0usize;

    for hit in hits {
        let hit = ensure_valid_url(hit);
        let title_key = hit.title.to_ascii_lowercase().trim().to_string();
        let key = (hit.url.clone(), title_key.clone());

        if !seen_keys.insert(key.clone()) {
            dropped += 1;
            continue;
        }

        let domain = extract_domain(&hit.url);
        let prefix = path_prefix(&hit.url);
        let tokens = tokenize(&hit.title);

        let is_dup = kept.iter().any(|k| {
            k.domain.is_some() && k.domain == domain && k.path_prefix == prefix && jaccard(&k.tokens, &tokens) >= 0.8
        });

        if is_dup {
            dropped += 1;
            continue;
        }

        kept.push(Kept {
            domain,
            path_prefix: prefix,
            tokens,
        });
        out.push(hit);
    }

    (out, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mk(title: &str, url: &str) -> RawHit {
        RawHit {
            title: title.to_string(),
            url: url.to_string(),
            snippet: String::new(),
            source: "test".to_string(),
            published_date: Utc::now(),
            engine: "test".to_string(),
            url_verified: true,
            author: None,
            image_url: None,
            api_source: None,
        }
    }

    #[test]
    fn dedupes_by_normalized_url_tracking_params() {
        let hits = vec![
            mk("Hotel X opens", "https://site.tld/a?utm=x"),
            mk("Hotel X opens", "https://site.tld/a?utm=y"),
        ];
        let (out, dropped) = dedupe_hits(hits);
        assert_eq!(out.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(out[0].url, "https://site.tld/a");
    }

    #[test]
    fn keeps_distinct_hosts() {
        let hits = vec![
            mk("Hotel X opens", "https://site-a.tld/articles/a"),
            mk("Hotel X opens", "https://site-b.tld/articles/a"),
        ];
        let (out, _) = dedupe_hits(hits);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn collapses_similar_titles_same_host_prefix() {
        let hits = vec![
            mk(
                "Hotel Downtown Announces Major Expansion Project",
                "https://site.tld/articles/a",
            ),
            mk(
                "Hotel Downtown Announces Major Expansion",
                "https://site.tld/articles/b",
            ),
        ];
        let (out, dropped) = dedupe_hits(hits);
        assert_eq!(out.len(), 1);
        assert_eq!(dropped, 1);
    }
}
