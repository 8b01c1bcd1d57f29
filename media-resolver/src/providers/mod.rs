pub mod cobalt;
pub mod snaptik;
pub mod ssstik;
pub mod tiktok_page;
pub mod tikwm;
pub mod vxtwitter;

use async_trait::async_trait;

use crate::{MediaDescriptor, Result};

/// Common trait for all extraction providers.
///
/// `Ok(Some(_))` is a resolved descriptor, `Ok(None)` a soft miss (provider
/// reachable, no usable media reference), `Err(_)` a hard failure (transport
/// error, bad status, malformed payload). The orchestrator advances the chain
/// on both misses and failures but records them differently.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn attempt(&self, url: &str) -> Result<Option<MediaDescriptor>>;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}
