//! HTTP Transport Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::HttpTransport,
};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Reqwest-based HTTP transport implementation
///
/// Provides the narrow GET-for-text capability the proxy fetch layer needs,
/// with:
/// - Connection pooling via reqwest
/// - TLS support by default
/// - A generous safety-net timeout (the fetch layer applies its own
///   per-attempt deadline on top)
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new transport with default configuration
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new transport with a custom safety-net timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("resonance-core/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Create a new transport around a preconfigured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::Timeout(format!("GET {url}"))
            } else if e.is_connect() {
                BridgeError::OperationFailed(format!("Connection failed: {e}"))
            } else {
                BridgeError::OperationFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "HTTP {} for {url}",
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::Timeout(format!("GET {url} (body)"))
            } else {
                BridgeError::OperationFailed(e.to_string())
            }
        })?;

        debug!(url, bytes = body.len(), "Fetched text body");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transport_creation() {
        let _transport = ReqwestTransport::new();
        // Just verify it constructs
    }

    #[tokio::test]
    async fn test_custom_timeout_construction() {
        let _transport = ReqwestTransport::with_timeout(Duration::from_secs(5));
    }
}
