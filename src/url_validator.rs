//! URL syntax/semantic checks, normalization, and fallback synthesis (C2).

use url::Url;

const REJECTED_PATH_SEGMENTS: &[&str] = &[
    "search", "tag", "category", "author", "page", "feed", "rss", "comments", "login", "register",
];

const BINARY_SUFFIXES: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".pdf", ".doc", ".docx", ".xls", ".xlsx",
    ".zip", ".mp4", ".mp3",
];

/// `http(s)`, hostname long enough, not a listing/utility page, not a binary asset.
pub fn is_article_url(u: &str) -> bool {
    let Ok(parsed) = Url::parse(u) else {
        return false;
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    if host.len() < 4 {
        return false;
    }

    let path_lower = parsed.path().to_ascii_lowercase();
    if BINARY_SUFFIXES.iter().any(|ext| path_lower.ends_with(ext)) {
        return false;
    }

    let segments: Vec<&str> = path_lower.split('/').filter(|s| !s.is_empty()).collect();
    if segments
        .iter()
        .any(|seg| REJECTED_PATH_SEGMENTS.contains(seg))
    {
        return false;
    }

    true
}

/// Strip query, fragment, and trailing slash; keep scheme+host+path.
pub fn normalize(u: &str) -> Option<String> {
    let mut parsed = Url::parse(u).ok()?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    let mut s = parsed.to_string();
    if s.ends_with('/') && parsed.path() != "/" {
        s.pop();
    }
    Some(s)
}

/// Host without a leading `www.`.
pub fn extract_domain(u: &str) -> Option<String> {
    let parsed = Url::parse(u).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn slugify(s: &str, max_len: usize) -> String {
    let mut slug = String::new();
    let mut last_was_dash = false;
    for c in s.to_ascii_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    slug.chars().take(max_len).collect()
}

/// Stable placeholder URL when an adapter has a title but no valid URL.
/// The hit is marked `url_verified=false` by the caller.
pub fn synthesize_fallback(title: &str, source: &str) -> String {
    let source_slug = slugify(source, 40);
    let title_slug = slugify(title, 50);
    format!("https://news-search-result/{source_slug}/{title_slug}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_scheme() {
        assert!(!is_article_url("ftp://example.com/a"));
    }

    #[test]
    fn rejects_search_pages() {
        assert!(!is_article_url("https://news.example.com/search?q=hotel"));
    }

    #[test]
    fn rejects_binary_assets() {
        assert!(!is_article_url("https://example.com/photo.jpg"));
    }

    #[test]
    fn accepts_plain_article() {
        assert!(is_article_url("https://example.com/articles/hotel-opens"));
    }

    #[test]
    fn normalize_strips_query_fragment_and_trailing_slash() {
        assert_eq!(
            normalize("https://site.tld/a?utm=x#frag").unwrap(),
            "https://site.tld/a"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("https://site.tld/a?utm=x/").unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn extract_domain_strips_www() {
        assert_eq!(
            extract_domain("https://www.example.com/a").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn synthesize_fallback_is_stable() {
        let a = synthesize_fallback("Hotel X Opens Downtown", "Local News");
        let b = synthesize_fallback("Hotel X Opens Downtown", "Local News");
        assert_eq!(a, b);
        assert!(a.starts_with("https://news-search-result/local-news/"));
    }
}
