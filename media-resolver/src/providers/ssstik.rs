use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::request::browser_client;
use crate::url_parser::UrlParser;
use crate::{MediaDescriptor, ResolveError, Result};

use super::Provider;

const API_URL: &str = "https://ssstik.io/abc";

/// Mirror-site JSON provider.
///
/// Submits the post URL with the fixed locale/token fields the endpoint
/// expects and reads the direct URL plus optional cover, duration, author
/// and title from the JSON response.
pub struct SsstikProvider {
    client: Client,
    parser: UrlParser,
}

impl SsstikProvider {
    pub fn new() -> Self {
        Self {
            client: browser_client(Duration::from_secs(30)),
            parser: UrlParser::new(),
        }
    }
}

impl Default for SsstikProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for SsstikProvider {
    async fn attempt(&self, url: &str) -> Result<Option<MediaDescriptor>> {
        let request = SsstikRequest {
            id: url,
            locale: "en",
            tt: "RFBiZ3Bi",
        };

        let response = self
            .client
            .post(API_URL)
            .header("Accept", "application/json, text/plain, */*")
            .header("Origin", "https://ssstik.io")
            .header("Referer", "https://ssstik.io/en")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResolveError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let payload: SsstikResponse = response.json().await?;

        let download_url = match payload.url {
            Some(ref u) if !u.is_empty() => u.clone(),
            _ => return Ok(None),
        };

        let id = self
            .parser
            .parse_identifier(url)
            .unwrap_or_else(|| "unknown".to_string());
        let title = payload
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "TikTok Video (SSSTik)".to_string());

        Ok(Some(MediaDescriptor {
            id,
            source_url: url.to_string(),
            title: title.clone(),
            author: payload
                .author
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            description: title,
            thumbnail: payload.cover.unwrap_or_default(),
            duration: payload.duration.unwrap_or(0),
            download_url,
            music_url: None,
            images: vec![],
            is_photo_carousel: false,
        }))
    }

    fn name(&self) -> &'static str {
        "ssstik"
    }
}

#[derive(Debug, Serialize)]
struct SsstikRequest<'a> {
    id: &'a str,
    locale: &'a str,
    tt: &'a str,
}

#[derive(Debug, Deserialize)]
struct SsstikResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    author: Option<String>,
}
