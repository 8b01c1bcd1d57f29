use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::providers::{
    cobalt::CobaltProvider, snaptik::SnaptikProvider, ssstik::SsstikProvider,
    tiktok_page::TikTokPageProvider, tikwm::TikwmProvider, vxtwitter::VxTwitterProvider, Provider,
};
use crate::{MediaDescriptor, Platform, ResolveError, Result, UrlParser};

/// Fallback orchestrator.
///
/// Holds one fixed, ordered provider chain per platform and walks it
/// strictly sequentially: the first resolved descriptor short-circuits the
/// remaining, possibly expensive, network calls. Individual provider
/// failures and misses are contained here and never propagate; only the
/// first success or a terminal exhaustion error crosses this boundary.
///
/// Stateless across calls; a single instance serves concurrent requests.
pub struct MediaResolver {
    parser: UrlParser,
    tiktok_chain: Vec<Arc<dyn Provider>>,
    twitter_chain: Vec<Arc<dyn Provider>>,
}

impl MediaResolver {
    pub fn new() -> Self {
        Self::with_chains(
            vec![
                Arc::new(SnaptikProvider::new()),
                Arc::new(SsstikProvider::new()),
                Arc::new(TikwmProvider::new()),
                Arc::new(TikTokPageProvider::new()),
            ],
            vec![
                Arc::new(VxTwitterProvider::new()),
                Arc::new(CobaltProvider::new()),
            ],
        )
    }

    /// Explicit chain ordering, mostly useful for tests and custom rankings.
    pub fn with_chains(
        tiktok_chain: Vec<Arc<dyn Provider>>,
        twitter_chain: Vec<Arc<dyn Provider>>,
    ) -> Self {
        Self {
            parser: UrlParser::new(),
            tiktok_chain,
            twitter_chain,
        }
    }

    pub fn detect_platform(&self, url: &str) -> Platform {
        self.parser.detect(url)
    }

    pub fn validate_url(&self, url: &str) -> bool {
        self.parser.validate(url)
    }

    /// Resolve a post URL to a normalized media descriptor.
    pub async fn resolve(&self, url: &str) -> Result<MediaDescriptor> {
        let platform = self.parser.detect(url);

        let chain = match platform {
            Platform::TikTok => &self.tiktok_chain,
            Platform::TwitterX => &self.twitter_chain,
            Platform::Unsupported => {
                return Err(ResolveError::UnsupportedPlatform(format!(
                    "please use a TikTok or Twitter/X link, got: {}",
                    url.trim()
                )))
            }
        };

        for provider in chain {
            match provider.attempt(url).await {
                Ok(Some(descriptor)) => {
                    info!(
                        provider = provider.name(),
                        platform = platform.as_str(),
                        id = %descriptor.id,
                        "resolved media"
                    );
                    return Ok(descriptor);
                }
                Ok(None) => {
                    debug!(provider = provider.name(), "no usable media, trying next method");
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "method failed, trying next");
                }
            }
        }

        Err(ResolveError::Exhausted {
            platform: platform.as_str(),
        })
    }
}

impl Default for MediaResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    enum MockOutcome {
        Success,
        Miss,
        Fail,
    }

    struct MockProvider {
        label: &'static str,
        outcome: MockOutcome,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(label: &'static str, outcome: MockOutcome) -> Arc<Self> {
            Arc::new(Self {
                label,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        async fn attempt(&self, url: &str) -> Result<Option<MediaDescriptor>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                MockOutcome::Success => Ok(Some(MediaDescriptor {
                    id: "42".to_string(),
                    source_url: url.to_string(),
                    title: self.label.to_string(),
                    author: "Unknown".to_string(),
                    description: String::new(),
                    thumbnail: String::new(),
                    duration: 0,
                    download_url: format!("https://cdn.example.com/{}.mp4", self.label),
                    music_url: None,
                    images: vec![],
                    is_photo_carousel: false,
                })),
                MockOutcome::Miss => Ok(None),
                MockOutcome::Fail => Err(ResolveError::Provider("mock failure".to_string())),
            }
        }

        fn name(&self) -> &'static str {
            self.label
        }
    }

    const TIKTOK_URL: &str = "https://www.tiktok.com/@user/video/7301234567890123456";

    #[tokio::test]
    async fn test_first_success_short_circuits_chain() {
        let first = MockProvider::new("first", MockOutcome::Fail);
        let second = MockProvider::new("second", MockOutcome::Miss);
        let third = MockProvider::new("third", MockOutcome::Success);
        let fourth = MockProvider::new("fourth", MockOutcome::Success);

        let resolver = MediaResolver::with_chains(
            vec![first.clone(), second.clone(), third.clone(), fourth.clone()],
            vec![],
        );

        let descriptor = resolver.resolve(TIKTOK_URL).await.unwrap();

        assert_eq!(descriptor.title, "third");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 1);
        assert_eq!(fourth.calls(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_yields_single_aggregate_error() {
        let first = MockProvider::new("first", MockOutcome::Fail);
        let second = MockProvider::new("second", MockOutcome::Miss);

        let resolver = MediaResolver::with_chains(vec![first.clone(), second.clone()], vec![]);

        let err = resolver.resolve(TIKTOK_URL).await.unwrap_err();

        assert!(matches!(err, ResolveError::Exhausted { platform: "TikTok" }));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_url_attempts_no_provider() {
        let tiktok = MockProvider::new("tiktok", MockOutcome::Success);
        let twitter = MockProvider::new("twitter", MockOutcome::Success);

        let resolver = MediaResolver::with_chains(vec![tiktok.clone()], vec![twitter.clone()]);

        let err = resolver
            .resolve("https://www.youtube.com/watch?v=abc")
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::UnsupportedPlatform(_)));
        assert_eq!(tiktok.calls(), 0);
        assert_eq!(twitter.calls(), 0);
    }

    #[tokio::test]
    async fn test_platform_selects_chain() {
        let tiktok = MockProvider::new("tiktok", MockOutcome::Success);
        let twitter = MockProvider::new("twitter", MockOutcome::Success);

        let resolver = MediaResolver::with_chains(vec![tiktok.clone()], vec![twitter.clone()]);

        let descriptor = resolver
            .resolve("https://x.com/someone/status/1712345678901234567")
            .await
            .unwrap();

        assert_eq!(descriptor.title, "twitter");
        assert_eq!(tiktok.calls(), 0);
        assert_eq!(twitter.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let first = MockProvider::new("first", MockOutcome::Miss);
        let second = MockProvider::new("second", MockOutcome::Success);

        let resolver = MediaResolver::with_chains(vec![first.clone(), second.clone()], vec![]);

        let a = resolver.resolve(TIKTOK_URL).await.unwrap();
        let b = resolver.resolve(TIKTOK_URL).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(first.calls(), 2);
        assert_eq!(second.calls(), 2);
    }
}
