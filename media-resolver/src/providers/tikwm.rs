use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::request::browser_client;
use crate::url_parser::UrlParser;
use crate::{ImageItem, MediaDescriptor, ResolveError, Result};

use super::Provider;

const API_URL: &str = "https://www.tikwm.com/api/";
const ORIGIN: &str = "https://www.tikwm.com";

/// Aggregator API provider.
///
/// The richest of the TikTok methods: the payload carries separate HD
/// no-watermark, SD no-watermark and watermarked stream URLs, a dedicated
/// audio stream, and an `images` array for photo carousels. Stream
/// preference is HD → SD → watermarked; relative URLs are rewritten against
/// the provider's own origin.
pub struct TikwmProvider {
    client: Client,
    parser: UrlParser,
}

impl TikwmProvider {
    pub fn new() -> Self {
        Self {
            client: browser_client(Duration::from_secs(30)),
            parser: UrlParser::new(),
        }
    }
}

impl Default for TikwmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for TikwmProvider {
    async fn attempt(&self, url: &str) -> Result<Option<MediaDescriptor>> {
        let request = TikwmRequest {
            url,
            count: 12,
            cursor: 0,
            web: 1,
            hd: 1,
        };

        let response = self
            .client
            .post(API_URL)
            .header("Accept", "application/json, text/plain, */*")
            .header("Origin", ORIGIN)
            .header("Referer", "https://www.tikwm.com/")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResolveError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let payload: TikwmResponse = response.json().await?;

        if payload.code != 0 {
            return Ok(None);
        }

        let data = match payload.data {
            Some(data) => data,
            None => return Ok(None),
        };

        let id = self
            .parser
            .parse_identifier(url)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(descriptor_from_payload(url, id, data))
    }

    fn name(&self) -> &'static str {
        "tikwm"
    }
}

/// Normalize the aggregator payload. `None` when it carries neither a
/// stream URL nor carousel images.
fn descriptor_from_payload(
    source_url: &str,
    id: String,
    data: TikwmData,
) -> Option<MediaDescriptor> {
    let images: Vec<ImageItem> = data
        .images
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, url)| ImageItem {
            id: format!("{}_img_{}", id, index),
            thumbnail: url.clone(),
            url,
        })
        .collect();
    let is_photo_carousel = !images.is_empty();

    // HD no-watermark first, then SD no-watermark, then watermarked.
    let download_url = [data.hdplay, data.play, data.wmplay]
        .into_iter()
        .flatten()
        .find(|u| !u.is_empty())
        .map(|u| absolutize(&u))
        .unwrap_or_default();

    if download_url.is_empty() && images.is_empty() {
        return None;
    }

    let title = data
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "TikTok Video (Tikwm)".to_string());

    Some(MediaDescriptor {
        id,
        source_url: source_url.to_string(),
        title: title.clone(),
        author: data
            .author
            .and_then(|a| a.nickname)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        description: title,
        thumbnail: data.cover.unwrap_or_default(),
        duration: data.duration.unwrap_or(0),
        download_url,
        music_url: data.music.filter(|m| !m.is_empty()),
        images,
        is_photo_carousel,
    })
}

/// The aggregator sometimes returns paths relative to its own origin.
fn absolutize(url: &str) -> String {
    if url.starts_with('/') {
        format!("{}{}", ORIGIN, url)
    } else {
        url.to_string()
    }
}

#[derive(Debug, Serialize)]
struct TikwmRequest<'a> {
    url: &'a str,
    count: u32,
    cursor: u32,
    web: u8,
    hd: u8,
}

#[derive(Debug, Deserialize)]
struct TikwmResponse {
    code: i32,
    #[serde(default)]
    data: Option<TikwmData>,
}

#[derive(Debug, Default, Deserialize)]
struct TikwmData {
    #[serde(default)]
    hdplay: Option<String>,
    #[serde(default)]
    play: Option<String>,
    #[serde(default)]
    wmplay: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    music: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    author: Option<TikwmAuthor>,
}

#[derive(Debug, Deserialize)]
struct TikwmAuthor {
    #[serde(default)]
    nickname: Option<String>,
}
