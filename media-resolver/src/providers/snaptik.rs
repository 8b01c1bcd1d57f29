use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::request::browser_client_with_cookies;
use crate::url_parser::UrlParser;
use crate::{MediaDescriptor, ResolveError, Result};

use super::Provider;

const BASE_URL: &str = "https://snaptik.app/";
const SUBMIT_URL: &str = "https://snaptik.app/abc2.php";

/// Mirror-site scraping provider.
///
/// Two-step interaction: an initial fetch of the mirror's landing page to
/// pick up session cookies, then a form submission carrying the post URL.
/// The returned markup is scanned for anchors referencing a direct media
/// file; the first one wins. Title and author are not recoverable here.
pub struct SnaptikProvider {
    client: Client,
    parser: UrlParser,
}

impl SnaptikProvider {
    pub fn new() -> Self {
        Self {
            client: browser_client_with_cookies(Duration::from_secs(30)),
            parser: UrlParser::new(),
        }
    }
}

impl Default for SnaptikProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for SnaptikProvider {
    async fn attempt(&self, url: &str) -> Result<Option<MediaDescriptor>> {
        // Session state first; the form endpoint rejects cold submissions.
        self.client.get(BASE_URL).send().await?;

        let response = self
            .client
            .post(SUBMIT_URL)
            .header("Referer", BASE_URL)
            .header("Origin", "https://snaptik.app")
            .form(&[("url", url)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResolveError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let download_url = match first_media_link(&body) {
            Some(link) => link,
            None => return Ok(None),
        };

        let id = self
            .parser
            .parse_identifier(url)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Some(MediaDescriptor {
            id,
            source_url: url.to_string(),
            title: "TikTok Video (Snaptik)".to_string(),
            author: "Unknown".to_string(),
            description: "Downloaded via Snaptik".to_string(),
            thumbnail: String::new(),
            duration: 0,
            download_url,
            music_url: None,
            images: vec![],
            is_photo_carousel: false,
        }))
    }

    fn name(&self) -> &'static str {
        "snaptik"
    }
}

/// First anchor in the markup that references a direct .mp4 file.
fn first_media_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"a[href*=".mp4"], a[download*=".mp4"]"#).unwrap();

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains(".mp4"))
        .map(|href| href.to_string())
}
