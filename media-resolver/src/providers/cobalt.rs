use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::request::browser_client;
use crate::{ImageItem, MediaDescriptor, ResolveError, Result};

use super::Provider;

/// Public community instances, tried in list order.
const DEFAULT_INSTANCES: [&str; 5] = [
    "https://cobalt.api.timelessnesses.me/",
    "https://co.wuk.sh/",
    "https://cobalt.ggtyler.dev/",
    "https://cobalt-api.mrtoxic.dev/",
    "https://cobalt.privacyredirect.com/",
];

/// Multi-instance conversion service provider.
///
/// Retries the same method across independently operated instances: an
/// instance-level error moves on to the next instance, not the next
/// top-level method. Only when every instance has failed does the provider
/// itself report a failure, carrying the per-instance detail.
pub struct CobaltProvider {
    client: Client,
    instances: Vec<String>,
}

impl CobaltProvider {
    pub fn new() -> Self {
        Self::with_instances(DEFAULT_INSTANCES.iter().map(|i| i.to_string()).collect())
    }

    /// Instance ranking is configuration, passed in explicitly.
    pub fn with_instances(instances: Vec<String>) -> Self {
        Self {
            client: browser_client(Duration::from_secs(20)),
            instances,
        }
    }

    async fn try_instance(&self, base_url: &str, url: &str) -> Result<Option<MediaDescriptor>> {
        let request = CobaltRequest {
            url,
            video_quality: "max",
            filename_style: "basic",
        };

        let response = self
            .client
            .post(base_url)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResolveError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let payload: CobaltResponse = response.json().await?;
        descriptor_from_response(url, payload)
    }
}

impl Default for CobaltProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for CobaltProvider {
    async fn attempt(&self, url: &str) -> Result<Option<MediaDescriptor>> {
        let mut errors = Vec::new();

        for instance in &self.instances {
            match self.try_instance(instance, url).await {
                Ok(Some(descriptor)) => return Ok(Some(descriptor)),
                Ok(None) => debug!(instance = %instance, "no usable media in response"),
                Err(e) => errors.push(format!("{}: {}", instance, e)),
            }
        }

        // Every instance answered but none carried media.
        if errors.is_empty() {
            return Ok(None);
        }

        Err(ResolveError::Provider(format!(
            "all instances failed: {}",
            errors.join("; ")
        )))
    }

    fn name(&self) -> &'static str {
        "cobalt"
    }
}

/// Map the discriminated response union onto the normalized descriptor.
fn descriptor_from_response(
    source_url: &str,
    payload: CobaltResponse,
) -> Result<Option<MediaDescriptor>> {
    match payload {
        CobaltResponse::Error { error } => {
            let code = error
                .and_then(|e| e.code)
                .unwrap_or_else(|| "unknown".to_string());
            Err(ResolveError::Provider(format!("instance error: {}", code)))
        }
        CobaltResponse::Tunnel { url, filename }
        | CobaltResponse::Redirect { url, filename } => Ok(Some(MediaDescriptor {
            id: synthetic_id(),
            source_url: source_url.to_string(),
            title: filename
                .as_deref()
                .map(strip_extension)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Social Media Video".to_string()),
            author: "Unknown".to_string(),
            description: String::new(),
            thumbnail: String::new(),
            duration: 0,
            download_url: url,
            music_url: None,
            images: vec![],
            is_photo_carousel: false,
        })),
        CobaltResponse::Picker { picker, filename } => {
            let video = picker.iter().find(|item| item.kind == "video");
            let photos: Vec<&CobaltPickerItem> =
                picker.iter().filter(|item| item.kind == "photo").collect();

            if video.is_none() && photos.is_empty() {
                return Ok(None);
            }

            let images: Vec<ImageItem> = photos
                .iter()
                .enumerate()
                .map(|(index, item)| ImageItem {
                    id: format!("img_{}", index),
                    url: item.url.clone(),
                    thumbnail: item.thumb.clone().unwrap_or_else(|| item.url.clone()),
                })
                .collect();

            let thumbnail = picker
                .first()
                .and_then(|item| item.thumb.clone())
                .unwrap_or_default();
            let is_photo_carousel = !images.is_empty() && video.is_none();

            Ok(Some(MediaDescriptor {
                id: synthetic_id(),
                source_url: source_url.to_string(),
                title: filename
                    .as_deref()
                    .map(strip_extension)
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "Social Media Content".to_string()),
                author: "Unknown".to_string(),
                description: String::new(),
                thumbnail,
                duration: 0,
                download_url: video.map(|v| v.url.clone()).unwrap_or_default(),
                music_url: None,
                images,
                is_photo_carousel,
            }))
        }
    }
}

fn synthetic_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

fn strip_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct CobaltRequest<'a> {
    url: &'a str,
    #[serde(rename = "videoQuality")]
    video_quality: &'a str,
    #[serde(rename = "filenameStyle")]
    filename_style: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum CobaltResponse {
    Error {
        #[serde(default)]
        error: Option<CobaltErrorBody>,
    },
    Tunnel {
        url: String,
        #[serde(default)]
        filename: Option<String>,
    },
    Redirect {
        url: String,
        #[serde(default)]
        filename: Option<String>,
    },
    Picker {
        #[serde(default)]
        picker: Vec<CobaltPickerItem>,
        #[serde(default)]
        filename: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct CobaltErrorBody {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CobaltPickerItem {
    #[serde(rename = "type")]
    kind: String,
    url: String,
    #[serde(default)]
    thumb: Option<String>,
}
