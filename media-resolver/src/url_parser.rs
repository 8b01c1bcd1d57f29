use regex::Regex;

use crate::Platform;

/// URL classifier and identifier extractor for supported platforms.
///
/// Pattern sets are mutually exclusive by domain; the first platform whose
/// set matches wins. Pure string matching, no network access.
pub struct UrlParser {
    platform_patterns: Vec<(Platform, Vec<Regex>)>,
    id_patterns: Vec<Regex>,
}

impl UrlParser {
    pub fn new() -> Self {
        let tiktok = vec![
            Regex::new(r"^(https?://)?(www\.)?tiktok\.com/@[\w.-]+/video/\d+").unwrap(),
            Regex::new(r"^(https?://)?(www\.)?tiktok\.com/[\w.-]+/video/\d+").unwrap(),
            Regex::new(r"^(https?://)?vm\.tiktok\.com/\w+").unwrap(),
            Regex::new(r"^(https?://)?vt\.tiktok\.com/\w+").unwrap(),
            Regex::new(r"^(https?://)?m\.tiktok\.com/v/\d+").unwrap(),
            Regex::new(r"^(https?://)?(www\.)?tiktok\.com/t/\w+").unwrap(),
        ];

        let twitter = vec![
            Regex::new(r"^(https?://)?(www\.)?(twitter|x)\.com/\w+/status/\d+").unwrap(),
            Regex::new(r"^(https?://)?t\.co/\w+").unwrap(),
        ];

        let id_patterns = vec![
            Regex::new(r"/video/(\d+)").unwrap(),
            Regex::new(r"/v/(\d+)").unwrap(),
            Regex::new(r"vm\.tiktok\.com/(\w+)").unwrap(),
            Regex::new(r"vt\.tiktok\.com/(\w+)").unwrap(),
            Regex::new(r"/t/(\w+)").unwrap(),
            Regex::new(r"/status/(\d+)").unwrap(),
            Regex::new(r"/p/([\w-]+)").unwrap(),
            Regex::new(r"/reel/([\w-]+)").unwrap(),
            Regex::new(r"/videos/(\d+)").unwrap(),
            Regex::new(r"v=(\d+)").unwrap(),
            Regex::new(r"fb\.watch/([\w-]+)").unwrap(),
        ];

        Self {
            platform_patterns: vec![(Platform::TikTok, tiktok), (Platform::TwitterX, twitter)],
            id_patterns,
        }
    }

    /// Classify a raw URL string. Empty input yields `Unsupported`.
    pub fn detect(&self, url: &str) -> Platform {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Platform::Unsupported;
        }

        for (platform, patterns) in &self.platform_patterns {
            if patterns.iter().any(|p| p.is_match(trimmed)) {
                return *platform;
            }
        }

        Platform::Unsupported
    }

    /// Pre-flight guard used before any network call.
    pub fn validate(&self, url: &str) -> bool {
        self.detect(url) != Platform::Unsupported
    }

    /// Best-effort content identifier for display and filename purposes.
    pub fn parse_identifier(&self, url: &str) -> Option<String> {
        for pattern in &self.id_patterns {
            if let Some(captures) = pattern.captures(url) {
                if let Some(id) = captures.get(1) {
                    return Some(id.as_str().to_string());
                }
            }
        }

        None
    }
}

impl Default for UrlParser {
    fn default() -> Self {
        Self::new()
    }
}
