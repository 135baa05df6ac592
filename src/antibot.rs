//! User-agent rotation and stealth headers for outbound HTTP requests.
//!
//! Trimmed from the teacher's browser-fingerprinting module: no viewport or
//! `sec-ch-ua` machinery since this client never renders a page, just a
//! rotating UA pool and the header set that makes a plain HTTP GET look less
//! like a bot.

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.2; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Built-in fallback UA used when `USER_AGENT` is unset — a recent, generic
/// desktop Chrome string rather than anything from the rotation pool.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Stable UA used on every request by default: `USER_AGENT` env var, else a
/// built-in modern-browser string. Only abandoned for pool rotation once the
/// health monitor has seen a block for that engine.
pub fn get_default_user_agent() -> String {
    std::env::var("USER_AGENT")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
}

/// Pick a random user agent string for the next outbound request. Used only
/// once a provider has previously responded with a block symptom.
pub fn get_random_user_agent() -> &'static str {
    use rand::prelude::*;
    let mut rng = rand::rng();
    let index = rng.random_range(0..USER_AGENTS.len());
    USER_AGENTS[index]
}

/// Header set that accompanies the rotated UA on every request.
pub fn get_stealth_headers() -> Vec<(String, String)> {
    vec![
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        ),
        ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        ("Connection".to_string(), "keep-alive".to_string()),
        ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agents_look_like_browsers() {
        assert!(USER_AGENTS.iter().all(|ua| ua.contains("Mozilla")));
    }

    #[test]
    fn stealth_headers_nonempty() {
        assert!(!get_stealth_headers().is_empty());
    }

    #[test]
    fn default_user_agent_falls_back_when_env_unset() {
        std::env::remove_var("USER_AGENT");
        assert!(get_default_user_agent().contains("Mozilla"));
    }
}
