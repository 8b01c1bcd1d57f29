use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::request::browser_client;
use crate::url_parser::UrlParser;
use crate::{MediaDescriptor, ResolveError, Result};

use super::Provider;

/// Marker identifying the client-side data blob inside the page markup.
const SCRIPT_MARKER: &str = "webapp.video-detail";

/// Direct-page scraping provider.
///
/// Resolves short links to their canonical form, fetches the page and scans
/// embedded script content for the platform's client-side data blob. The
/// download address is preferred over the play address when both appear.
pub struct TikTokPageProvider {
    client: Client,
    resolve_client: Client,
    parser: UrlParser,
    play_addr: Regex,
    download_addr: Regex,
}

impl TikTokPageProvider {
    pub fn new() -> Self {
        Self {
            client: browser_client(Duration::from_secs(30)),
            resolve_client: browser_client(Duration::from_secs(10)),
            parser: UrlParser::new(),
            play_addr: Regex::new(r#""playAddr":"([^"]+)""#).unwrap(),
            download_addr: Regex::new(r#""downloadAddr":"([^"]+)""#).unwrap(),
        }
    }

    /// Follow redirects on shortened link shapes; on any error keep the
    /// original URL and let the page fetch surface the failure.
    async fn resolve_url(&self, url: &str) -> String {
        let shortened = url.contains("vm.tiktok.com")
            || url.contains("vt.tiktok.com")
            || url.contains("/t/");
        if !shortened {
            return url.to_string();
        }

        match self.resolve_client.head(url).send().await {
            Ok(response) => response.url().to_string(),
            Err(_) => url.to_string(),
        }
    }
}

impl Default for TikTokPageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for TikTokPageProvider {
    async fn attempt(&self, url: &str) -> Result<Option<MediaDescriptor>> {
        let resolved = self.resolve_url(url).await;

        let response = self
            .client
            .get(&resolved)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResolveError::Api {
                status: response.status().as_u16(),
                message: "page fetch failed".to_string(),
            });
        }

        let body = response.text().await?;
        let download_url = match self.extract_media_address(&body) {
            Some(addr) => addr,
            None => return Ok(None),
        };

        let id = self
            .parser
            .parse_identifier(url)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Some(MediaDescriptor {
            id,
            source_url: url.to_string(),
            title: "TikTok Video (Direct)".to_string(),
            author: "Unknown".to_string(),
            description: "Downloaded via direct scraping".to_string(),
            thumbnail: String::new(),
            duration: 0,
            download_url,
            music_url: None,
            images: vec![],
            is_photo_carousel: false,
        }))
    }

    fn name(&self) -> &'static str {
        "tiktok-page"
    }
}

impl TikTokPageProvider {
    /// Scan script elements for the data blob and pull a usable address out
    /// of it, unescaping the JSON-encoded path separators.
    fn extract_media_address(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("script").unwrap();

        for script in document.select(&selector) {
            let content: String = script.text().collect();
            if !content.contains(SCRIPT_MARKER) {
                continue;
            }

            let addr = self
                .download_addr
                .captures(&content)
                .or_else(|| self.play_addr.captures(&content))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().replace("\\u002F", "/"));

            if addr.is_some() {
                return addr;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_script(script: &str) -> String {
        format!(
            "<html><head><script>var unrelated = 1;</script></head><body><script>{}</script></body></html>",
            script
        )
    }

    #[test]
    fn test_prefers_download_addr() {
        let provider = TikTokPageProvider::new();
        let html = page_with_script(
            r#"{"scope":"webapp.video-detail","playAddr":"https://cdn.example.com/play.mp4","downloadAddr":"https://cdn.example.com/dl.mp4"}"#,
        );

        assert_eq!(
            provider.extract_media_address(&html),
            Some("https://cdn.example.com/dl.mp4".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_play_addr() {
        let provider = TikTokPageProvider::new();
        let html = page_with_script(
            r#"{"scope":"webapp.video-detail","playAddr":"https://cdn.example.com/play.mp4"}"#,
        );

        assert_eq!(
            provider.extract_media_address(&html),
            Some("https://cdn.example.com/play.mp4".to_string())
        );
    }

    #[test]
    fn test_unescapes_path_separators() {
        let provider = TikTokPageProvider::new();
        let escaped = "{\"scope\":\"webapp.video-detail\",\"downloadAddr\":\"https:\\u002F\\u002Fcdn.example.com\\u002Fv\\u002Fdl.mp4\"}";
        let html = page_with_script(escaped);

        assert_eq!(
            provider.extract_media_address(&html),
            Some("https://cdn.example.com/v/dl.mp4".to_string())
        );
    }

    #[test]
    fn test_ignores_scripts_without_marker() {
        let provider = TikTokPageProvider::new();
        let html = page_with_script(r#"{"playAddr":"https://cdn.example.com/x.mp4"}"#);

        assert_eq!(provider.extract_media_address(&html), None);
    }
}
