use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error};

use media_resolver::request::referer_for;

use crate::handlers::error_body;
use crate::AppState;

/// Streaming media proxy.
///
/// Re-serves an upstream CDN stream under this origin with a corrected
/// content type. Upstream CDNs report inconsistent or generic content types
/// that make client players misinterpret the stream, so each endpoint pins
/// its own: `video/mp4` on the video route, `audio/mpeg` on the audio route
/// (kept only when the upstream already declares an audio type). Incoming
/// range requests are forwarded upstream and partial responses relayed back.

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Clone, Copy)]
enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn accept(&self) -> &'static str {
        match self {
            StreamKind::Video => {
                "video/webm,video/ogg,video/*;q=0.9,application/ogg;q=0.7,audio/*;q=0.6,*/*;q=0.5"
            }
            StreamKind::Audio => "audio/*,video/*;q=0.9,*/*;q=0.8",
        }
    }

    fn filename(&self) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d-%H-%M-%S");
        match self {
            StreamKind::Video => format!("video-{}.mp4", timestamp),
            StreamKind::Audio => format!("audio-{}.mp3", timestamp),
        }
    }
}

pub async fn video(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
) -> Response {
    stream_media(&state, params.url, &headers, StreamKind::Video).await
}

pub async fn audio(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
) -> Response {
    stream_media(&state, params.url, &headers, StreamKind::Audio).await
}

async fn stream_media(
    state: &AppState,
    target: Option<String>,
    request_headers: &HeaderMap,
    kind: StreamKind,
) -> Response {
    let target = match target
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
    {
        Some(t) => t,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                error_body("a valid media URL query parameter is required"),
            )
                .into_response()
        }
    };

    debug!(%target, "proxying media");

    let mut request = state
        .http_client
        .get(&target)
        .header(header::ACCEPT, kind.accept())
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .header(header::ACCEPT_ENCODING, "identity");

    if let Some(referer) = referer_for(&target) {
        request = request.header(header::REFERER, referer);
    }

    // Relay range requests so players can seek through the proxy.
    if let Some(range) = request_headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
    {
        request = request.header(header::RANGE, range);
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            error!(%target, error = %e, "upstream fetch failed");
            return (
                StatusCode::BAD_GATEWAY,
                error_body(format!("failed to fetch media: {}", e)),
            )
                .into_response();
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        error!(%target, status = status.as_u16(), "upstream returned error status");
        return (
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            error_body(format!("failed to fetch media: {}", status.as_u16())),
        )
            .into_response();
    }

    let upstream_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let content_type = response_content_type(kind, upstream_type.as_deref());

    let mut builder = Response::builder()
        .status(StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::OK))
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", kind.filename()),
        )
        .header(header::CACHE_CONTROL, "no-cache");

    for name in [
        header::CONTENT_LENGTH,
        header::CONTENT_RANGE,
        header::ACCEPT_RANGES,
    ] {
        if let Some(value) = upstream.headers().get(&name).and_then(|v| v.to_str().ok()) {
            builder = builder.header(name.clone(), value.to_string());
        }
    }

    match builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "failed to build proxy response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("failed to build proxy response"),
            )
                .into_response()
        }
    }
}

/// The served content type. Video is always pinned; audio keeps an upstream
/// `audio/*` declaration (the source may already be an audio-only file) and
/// pins `audio/mpeg` for everything else.
fn response_content_type(kind: StreamKind, upstream: Option<&str>) -> String {
    match kind {
        StreamKind::Video => "video/mp4".to_string(),
        StreamKind::Audio => match upstream {
            Some(t) if t.starts_with("audio/") => t.to_string(),
            _ => "audio/mpeg".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_type_is_always_pinned() {
        assert_eq!(
            response_content_type(StreamKind::Video, Some("application/octet-stream")),
            "video/mp4"
        );
        assert_eq!(
            response_content_type(StreamKind::Video, Some("audio/mp4")),
            "video/mp4"
        );
        assert_eq!(response_content_type(StreamKind::Video, None), "video/mp4");
    }

    #[test]
    fn test_audio_keeps_upstream_audio_type() {
        assert_eq!(
            response_content_type(StreamKind::Audio, Some("audio/mp4")),
            "audio/mp4"
        );
        assert_eq!(
            response_content_type(StreamKind::Audio, Some("video/mp4")),
            "audio/mpeg"
        );
        assert_eq!(response_content_type(StreamKind::Audio, None), "audio/mpeg");
    }

    #[test]
    fn test_filenames_carry_extension() {
        assert!(StreamKind::Video.filename().ends_with(".mp4"));
        assert!(StreamKind::Audio.filename().ends_with(".mp3"));
    }
}
