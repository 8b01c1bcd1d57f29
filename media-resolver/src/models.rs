use serde::{Deserialize, Serialize};

/// Platform hosting the post behind an incoming URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTok,
    TwitterX,
    Unsupported,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::TwitterX => "Twitter/X",
            Platform::Unsupported => "unsupported",
        }
    }
}

/// One still image of a photo carousel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageItem {
    /// Unique within the descriptor; encodes the carousel position.
    pub id: String,
    pub url: String,
    /// Falls back to `url` when the provider has no distinct thumbnail.
    pub thumbnail: String,
}

/// Normalized result of a successful resolution.
///
/// Constructed exactly once, inside the provider that resolved it, and never
/// mutated afterwards. A descriptor is video-bearing (`download_url`
/// non-empty), photo-bearing (`images` non-empty), or both; a provider that
/// can produce neither returns a soft miss instead of a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaDescriptor {
    /// Best-effort content identifier, never empty.
    pub id: String,
    /// The post URL the caller supplied.
    pub source_url: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub thumbnail: String,
    /// Seconds; 0 when unknown or not applicable.
    pub duration: u32,
    /// Direct URL of the primary video/audio asset; empty for image-only posts.
    pub download_url: String,
    /// Dedicated audio-only stream, when the provider distinguishes one.
    pub music_url: Option<String>,
    pub images: Vec<ImageItem>,
    pub is_photo_carousel: bool,
}

impl MediaDescriptor {
    pub fn has_media(&self) -> bool {
        !self.download_url.is_empty() || !self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_media() {
        let mut descriptor = MediaDescriptor {
            id: "1".to_string(),
            source_url: "https://www.tiktok.com/@user/video/1".to_string(),
            title: "t".to_string(),
            author: "a".to_string(),
            description: String::new(),
            thumbnail: String::new(),
            duration: 0,
            download_url: "https://cdn.example.com/v.mp4".to_string(),
            music_url: None,
            images: vec![],
            is_photo_carousel: false,
        };
        assert!(descriptor.has_media());

        descriptor.download_url.clear();
        assert!(!descriptor.has_media());

        descriptor.images.push(ImageItem {
            id: "1_img_0".to_string(),
            url: "https://cdn.example.com/i.jpg".to_string(),
            thumbnail: "https://cdn.example.com/i.jpg".to_string(),
        });
        assert!(descriptor.has_media());
    }
}
