//! Audio Warmup via Background HTTP Fetch
//!
//! Desktop builds have no service-worker cache to warm, but the OS HTTP
//! stack and any forward proxy still benefit from a full fetch of the audio
//! resource right before the sink streams it. The request runs detached; the
//! caller never waits on it and never hears about its outcome.

use async_trait::async_trait;
use bridge_traits::cache::AudioWarmupCache;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fire-and-forget audio prefetcher.
pub struct HttpWarmupCache {
    client: Client,
}

impl HttpWarmupCache {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("resonance-core/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Build around a preconfigured client (shared pool with the transport).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpWarmupCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioWarmupCache for HttpWarmupCache {
    async fn precache(&self, url: &str) {
        let client = self.client.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            match client.get(&url).send().await {
                Ok(response) => {
                    // Drain the body so the bytes actually travel.
                    let status = response.status().as_u16();
                    let bytes = response.bytes().await.map(|b| b.len()).unwrap_or(0);
                    debug!(url, status, bytes, "Warmup fetch finished");
                }
                Err(err) => {
                    debug!(url, error = %err, "Warmup fetch failed");
                }
            }
        });
    }
}
