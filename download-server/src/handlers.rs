use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use media_resolver::MediaDescriptor;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Client hint, logged only; resolution always returns both stream URLs.
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub success: bool,
    pub download_url: String,
    pub audio_url: String,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub duration: u32,
    pub thumbnail: String,
    pub images: Vec<SelectableImage>,
}

#[derive(Debug, Serialize)]
pub struct SelectableImage {
    pub id: String,
    pub url: String,
    pub thumbnail: String,
    /// UI selection flag, always false from the server.
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

pub fn error_body(message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        success: false,
        error: message.into(),
    })
}

pub async fn download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Json<DownloadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let url = match request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    {
        Some(u) => u.to_string(),
        None => return Err((StatusCode::BAD_REQUEST, error_body("URL is required"))),
    };

    if !state.resolver.validate_url(&url) {
        return Err((
            StatusCode::BAD_REQUEST,
            error_body("Invalid TikTok or Twitter/X URL"),
        ));
    }

    info!(%url, media_type = ?request.media_type, "processing download request");

    let descriptor = state.resolver.resolve(&url).await.map_err(|e| {
        error!(%url, error = %e, "resolution failed");
        (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
    })?;

    let (download_url, audio_url) = proxy_urls(&descriptor);

    Ok(Json(DownloadResponse {
        success: true,
        download_url,
        audio_url,
        metadata: Metadata {
            title: descriptor.title,
            author: descriptor.author,
            duration: descriptor.duration,
            thumbnail: descriptor.thumbnail,
            images: descriptor
                .images
                .into_iter()
                .map(|img| SelectableImage {
                    id: img.id,
                    url: img.url,
                    thumbnail: img.thumbnail,
                    selected: false,
                })
                .collect(),
        },
    }))
}

/// Same-origin proxy URLs for the descriptor's streams.
///
/// The video proxy always wraps the primary stream. Audio prefers the
/// dedicated audio-only stream when the provider supplied one, so the audio
/// proxy never accidentally serves a video container; otherwise it reuses
/// the primary stream. Image-only carousels get empty proxy URLs.
fn proxy_urls(descriptor: &MediaDescriptor) -> (String, String) {
    let video = if descriptor.download_url.is_empty() {
        String::new()
    } else {
        format!(
            "/api/video?url={}",
            urlencoding::encode(&descriptor.download_url)
        )
    };

    let audio_source = descriptor
        .music_url
        .as_deref()
        .unwrap_or(&descriptor.download_url);
    let audio = if audio_source.is_empty() {
        String::new()
    } else {
        format!("/api/audio?url={}", urlencoding::encode(audio_source))
    };

    (video, audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> MediaDescriptor {
        MediaDescriptor {
            id: "123".to_string(),
            source_url: "https://www.tiktok.com/@user/video/123".to_string(),
            title: "t".to_string(),
            author: "a".to_string(),
            description: String::new(),
            thumbnail: String::new(),
            duration: 10,
            download_url: "https://cdn.example.com/v.mp4?tk=a&sig=b".to_string(),
            music_url: None,
            images: vec![],
            is_photo_carousel: false,
        }
    }

    #[test]
    fn test_video_proxy_wraps_primary_stream() {
        let (video, audio) = proxy_urls(&descriptor());

        assert_eq!(
            video,
            "/api/video?url=https%3A%2F%2Fcdn.example.com%2Fv.mp4%3Ftk%3Da%26sig%3Db"
        );
        // Without a dedicated audio stream the audio proxy reuses the video.
        assert_eq!(
            audio,
            "/api/audio?url=https%3A%2F%2Fcdn.example.com%2Fv.mp4%3Ftk%3Da%26sig%3Db"
        );
    }

    #[test]
    fn test_audio_prefers_dedicated_stream() {
        let mut d = descriptor();
        d.music_url = Some("https://cdn.example.com/audio.mp3".to_string());

        let (_, audio) = proxy_urls(&d);
        assert_eq!(audio, "/api/audio?url=https%3A%2F%2Fcdn.example.com%2Faudio.mp3");
    }

    #[test]
    fn test_image_only_descriptor_gets_empty_proxies() {
        let mut d = descriptor();
        d.download_url = String::new();

        let (video, audio) = proxy_urls(&d);
        assert!(video.is_empty());
        assert!(audio.is_empty());
    }
}
