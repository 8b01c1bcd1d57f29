use std::io::{Cursor, Write};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use media_resolver::request::referer_for;

use crate::handlers::error_body;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImagesRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub mode: BundleMode,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleMode {
    #[default]
    Zip,
    Individual,
}

#[derive(Debug, Serialize)]
pub struct IndividualResponse {
    pub success: bool,
    pub images: Vec<IndividualImage>,
}

#[derive(Debug, Serialize)]
pub struct IndividualImage {
    pub url: String,
    pub filename: String,
}

/// Image bundling endpoint.
///
/// Zip mode fetches every resolved image and returns one archive;
/// individual mode hands back per-image URLs and generated filenames for the
/// client to fetch one by one. Per-image fetch failures in zip mode skip the
/// image rather than failing the archive.
pub async fn bundle(
    State(state): State<AppState>,
    Json(request): Json<ImagesRequest>,
) -> Response {
    if request.urls.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_body("at least one image URL is required"),
        )
            .into_response();
    }

    match request.mode {
        BundleMode::Individual => {
            let images = request
                .urls
                .iter()
                .enumerate()
                .map(|(index, url)| IndividualImage {
                    url: url.clone(),
                    filename: image_filename(index, url),
                })
                .collect();

            Json(IndividualResponse {
                success: true,
                images,
            })
            .into_response()
        }
        BundleMode::Zip => archive(&state, &request.urls).await,
    }
}

async fn archive(state: &AppState, urls: &[String]) -> Response {
    let buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(buffer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut added = 0usize;

    for (index, url) in urls.iter().enumerate() {
        let bytes = match fetch_image(state, url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%url, error = %e, "skipping image");
                continue;
            }
        };

        let filename = image_filename(index, url);
        if let Err(e) = zip.start_file(filename, options) {
            warn!(%url, error = %e, "failed to add image to archive");
            continue;
        }
        if let Err(e) = zip.write_all(&bytes) {
            warn!(%url, error = %e, "failed to write image to archive");
            continue;
        }

        added += 1;
    }

    if added == 0 {
        return (
            StatusCode::BAD_GATEWAY,
            error_body("could not fetch any of the requested images"),
        )
            .into_response();
    }

    let buffer = match zip.finish() {
        Ok(buffer) => buffer,
        Err(e) => {
            warn!(error = %e, "failed to finalize archive");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("failed to build archive"),
            )
                .into_response();
        }
    };

    debug!(count = added, "built image archive");

    let archive_name = format!("images-{}.zip", Utc::now().format("%Y-%m-%d-%H-%M-%S"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", archive_name),
            ),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        buffer.into_inner(),
    )
        .into_response()
}

async fn fetch_image(state: &AppState, url: &str) -> reqwest::Result<Bytes> {
    let mut request = state.http_client.get(url);
    if let Some(referer) = referer_for(url) {
        request = request.header(header::REFERER, referer);
    }

    request.send().await?.error_for_status()?.bytes().await
}

/// Sequential archive-friendly filename; extension guessed from the URL path.
fn image_filename(index: usize, url: &str) -> String {
    format!("image_{:02}.{}", index + 1, extension_for(url))
}

fn extension_for(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('.').next().map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "png",
        Some(ext) if ext == "webp" => "webp",
        Some(ext) if ext == "gif" => "gif",
        Some(ext) if ext == "jpeg" || ext == "jpg" => "jpg",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_filenames_are_sequential() {
        assert_eq!(
            image_filename(0, "https://i.example.com/a.png?x=1"),
            "image_01.png"
        );
        assert_eq!(image_filename(1, "https://i.example.com/b.jpeg"), "image_02.jpg");
        assert_eq!(image_filename(11, "https://i.example.com/noext"), "image_12.jpg");
    }

    #[test]
    fn test_extension_guessing() {
        assert_eq!(extension_for("https://i.example.com/a.webp"), "webp");
        assert_eq!(extension_for("https://i.example.com/a.gif#frag"), "gif");
        assert_eq!(extension_for("https://i.example.com/photo"), "jpg");
    }

    #[test]
    fn test_mode_deserialization_defaults_to_zip() {
        let request: ImagesRequest =
            serde_json::from_str(r#"{"urls": ["https://i.example.com/a.jpg"]}"#).unwrap();
        assert_eq!(request.mode, BundleMode::Zip);

        let request: ImagesRequest = serde_json::from_str(
            r#"{"urls": ["https://i.example.com/a.jpg"], "mode": "individual"}"#,
        )
        .unwrap();
        assert_eq!(request.mode, BundleMode::Individual);
    }
}
