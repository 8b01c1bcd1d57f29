use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::request::browser_client;
use crate::{ImageItem, MediaDescriptor, ResolveError, Result};

use super::Provider;

/// Open mirror API provider for Twitter/X.
///
/// Keyed by username and numeric status id parsed out of the post URL; a URL
/// that does not match that shape is a hard failure, not a miss. The mirror's
/// media list is split into a primary video/animated entry and static images.
pub struct VxTwitterProvider {
    client: Client,
    status_pattern: Regex,
}

impl VxTwitterProvider {
    pub fn new() -> Self {
        Self {
            client: browser_client(Duration::from_secs(20)),
            status_pattern: Regex::new(r"(?:twitter|x)\.com/([^/]+)/status/(\d+)").unwrap(),
        }
    }

    fn parse_status_url(&self, url: &str) -> Result<(String, String)> {
        let captures = self
            .status_pattern
            .captures(url)
            .ok_or_else(|| ResolveError::InvalidUrl(format!("not a status URL: {}", url)))?;

        Ok((captures[1].to_string(), captures[2].to_string()))
    }
}

impl Default for VxTwitterProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for VxTwitterProvider {
    async fn attempt(&self, url: &str) -> Result<Option<MediaDescriptor>> {
        let (username, tweet_id) = self.parse_status_url(url)?;

        let api_url = format!("https://api.vxtwitter.com/{}/status/{}", username, tweet_id);
        let response = self
            .client
            .get(&api_url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResolveError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let payload: VxTwitterResponse = response.json().await?;
        let descriptor = descriptor_from_payload(url, &username, &tweet_id, payload)?;

        Ok(Some(descriptor))
    }

    fn name(&self) -> &'static str {
        "vxtwitter"
    }
}

fn descriptor_from_payload(
    source_url: &str,
    username: &str,
    tweet_id: &str,
    payload: VxTwitterResponse,
) -> Result<MediaDescriptor> {
    let media = if payload.media_extended.is_empty() {
        payload.media
    } else {
        payload.media_extended
    };

    let video = media
        .iter()
        .find(|m| m.kind == "video" || m.kind == "gif")
        .cloned();
    let photos: Vec<&VxMediaItem> = media.iter().filter(|m| m.kind == "image").collect();

    if video.is_none() && photos.is_empty() {
        return Err(ResolveError::Provider(
            "no downloadable media found in tweet".to_string(),
        ));
    }

    let images: Vec<ImageItem> = photos
        .iter()
        .enumerate()
        .map(|(index, item)| ImageItem {
            id: format!("tw_img_{}", index),
            url: item.url.clone(),
            thumbnail: item
                .thumbnail_url
                .clone()
                .unwrap_or_else(|| item.url.clone()),
        })
        .collect();

    let title = payload
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(summarize_text)
        .unwrap_or_else(|| format!("Tweet by @{}", username));

    let thumbnail = video
        .as_ref()
        .and_then(|v| v.thumbnail_url.clone())
        .or_else(|| photos.first().map(|p| p.url.clone()))
        .unwrap_or_default();

    let is_photo_carousel = !images.is_empty() && video.is_none();

    Ok(MediaDescriptor {
        id: tweet_id.to_string(),
        source_url: source_url.to_string(),
        title,
        author: payload
            .user_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.to_string()),
        description: payload.text.unwrap_or_default(),
        thumbnail,
        duration: 0,
        download_url: video.map(|v| v.url).unwrap_or_default(),
        music_url: None,
        images,
        is_photo_carousel,
    })
}

/// First 80 characters of the tweet text with whitespace runs collapsed.
fn summarize_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(80).collect()
}

#[derive(Debug, Deserialize)]
struct VxTwitterResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    media_extended: Vec<VxMediaItem>,
    #[serde(default)]
    media: Vec<VxMediaItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct VxMediaItem {
    #[serde(rename = "type")]
    kind: String,
    url: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: &str, url: &str, thumb: Option<&str>) -> VxMediaItem {
        VxMediaItem {
            kind: kind.to_string(),
            url: url.to_string(),
            thumbnail_url: thumb.map(|t| t.to_string()),
        }
    }

    fn payload(media: Vec<VxMediaItem>) -> VxTwitterResponse {
        VxTwitterResponse {
            text: Some("a  tweet\nwith   odd spacing".to_string()),
            user_name: Some("Display Name".to_string()),
            media_extended: media,
            media: vec![],
        }
    }

    #[test]
    fn test_parse_status_url() {
        let provider = VxTwitterProvider::new();

        let (user, id) = provider
            .parse_status_url("https://x.com/someone/status/1712345678901234567")
            .unwrap();
        assert_eq!(user, "someone");
        assert_eq!(id, "1712345678901234567");

        let (user, _) = provider
            .parse_status_url("https://twitter.com/other/status/42?s=20")
            .unwrap();
        assert_eq!(user, "other");

        assert!(provider
            .parse_status_url("https://x.com/someone")
            .is_err());
    }

    #[test]
    fn test_video_with_images_is_not_a_carousel() {
        let media = vec![
            item("video", "https://video.example.com/v.mp4", Some("https://t/v.jpg")),
            item("image", "https://img.example.com/1.jpg", None),
            item("image", "https://img.example.com/2.jpg", Some("https://t/2.jpg")),
        ];

        let descriptor =
            descriptor_from_payload("https://x.com/u/status/42", "u", "42", payload(media))
                .unwrap();

        assert!(!descriptor.is_photo_carousel);
        assert_eq!(descriptor.download_url, "https://video.example.com/v.mp4");
        assert_eq!(descriptor.images.len(), 2);
        assert_eq!(descriptor.images[0].url, "https://img.example.com/1.jpg");
        // Thumbnail falls back to the image URL when none is given.
        assert_eq!(descriptor.images[0].thumbnail, "https://img.example.com/1.jpg");
        assert_eq!(descriptor.images[1].thumbnail, "https://t/2.jpg");
    }

    #[test]
    fn test_images_only_is_a_carousel() {
        let media = vec![
            item("image", "https://img.example.com/1.jpg", None),
            item("image", "https://img.example.com/2.jpg", None),
        ];

        let descriptor =
            descriptor_from_payload("https://x.com/u/status/42", "u", "42", payload(media))
                .unwrap();

        assert!(descriptor.is_photo_carousel);
        assert!(descriptor.download_url.is_empty());
        assert_eq!(descriptor.thumbnail, "https://img.example.com/1.jpg");
    }

    #[test]
    fn test_animated_image_counts_as_video() {
        let media = vec![item("gif", "https://video.example.com/g.mp4", None)];

        let descriptor =
            descriptor_from_payload("https://x.com/u/status/42", "u", "42", payload(media))
                .unwrap();

        assert_eq!(descriptor.download_url, "https://video.example.com/g.mp4");
        assert!(!descriptor.is_photo_carousel);
    }

    #[test]
    fn test_no_media_is_a_hard_failure() {
        let result = descriptor_from_payload("https://x.com/u/status/42", "u", "42", payload(vec![]));
        assert!(matches!(result, Err(ResolveError::Provider(_))));
    }

    #[test]
    fn test_title_is_collapsed_and_bounded() {
        let mut p = payload(vec![item("video", "https://v/v.mp4", None)]);
        p.text = Some("word ".repeat(40));

        let descriptor =
            descriptor_from_payload("https://x.com/u/status/42", "u", "42", p).unwrap();

        assert!(descriptor.title.chars().count() <= 80);
        assert!(!descriptor.title.contains("  "));
    }
}
