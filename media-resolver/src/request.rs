use std::time::Duration;

use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::Client;
use url::Url;

/// Fixed browser identity presented on every outbound call.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Referer appropriate for the target host.
///
/// TikTok-family hosts (site and CDN) expect the TikTok site, Twitter/X-family
/// hosts expect the X site. Tunnel and relay hosts get none.
pub fn referer_for(target: &str) -> Option<&'static str> {
    let parsed = Url::parse(target).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();

    if matches_domain(&host, "tiktok.com") || matches_domain(&host, "tiktokcdn.com") {
        return Some("https://www.tiktok.com/");
    }

    if matches_domain(&host, "twitter.com")
        || matches_domain(&host, "x.com")
        || matches_domain(&host, "twimg.com")
        || matches_domain(&host, "t.co")
    {
        return Some("https://x.com/");
    }

    None
}

fn matches_domain(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Client with the browser user agent and a bounded per-call timeout.
pub fn browser_client(timeout: Duration) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, BROWSER_USER_AGENT.parse().unwrap());

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .unwrap()
}

/// Same identity, with a cookie store for providers that hand out session
/// state on a first request.
pub fn browser_client_with_cookies(timeout: Duration) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, BROWSER_USER_AGENT.parse().unwrap());

    Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .timeout(timeout)
        .build()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referer_selection() {
        assert_eq!(
            referer_for("https://www.tiktok.com/@user/video/123"),
            Some("https://www.tiktok.com/")
        );
        assert_eq!(
            referer_for("https://v16-webapp.tiktokcdn.com/video.mp4"),
            Some("https://www.tiktok.com/")
        );
        assert_eq!(
            referer_for("https://video.twimg.com/ext_tw_video/123.mp4"),
            Some("https://x.com/")
        );
        assert_eq!(
            referer_for("https://x.com/someone/status/1"),
            Some("https://x.com/")
        );
        // Tunnel hosts are served without a referer.
        assert_eq!(referer_for("https://co.wuk.sh/tunnel?id=abc"), None);
        assert_eq!(referer_for("not a url"), None);
    }

    #[test]
    fn test_domain_matching_is_suffix_safe() {
        assert_eq!(referer_for("https://nottiktok.com/video"), None);
        assert_eq!(referer_for("https://fax.com/x.com/"), None);
    }
}
