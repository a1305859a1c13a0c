//! Audio Byte-Cache Engagement
//!
//! The platform keeps its own durable byte cache for audio resources (a
//! service-worker cache, an HTTP disk cache, or similar). The core never
//! reads from it; it only asks the platform to warm a URL so the next `load`
//! on the sink is served locally. The contract is best-effort and
//! non-blocking: failures are swallowed by the implementation.

use async_trait::async_trait;

/// Best-effort engagement of the platform audio byte cache.
#[async_trait]
pub trait AudioWarmupCache: Send + Sync {
    /// Request that `url` be fetched into the platform byte cache.
    ///
    /// Must return quickly; implementations fire the actual fetch in the
    /// background and never report its outcome.
    async fn precache(&self, url: &str);
}

/// No-op implementation for hosts without a byte cache.
#[derive(Debug, Clone, Default)]
pub struct NoopWarmupCache;

#[async_trait]
impl AudioWarmupCache for NoopWarmupCache {
    async fn precache(&self, _url: &str) {}
}
