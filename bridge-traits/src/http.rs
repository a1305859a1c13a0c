//! HTTP Transport Abstraction
//!
//! The fetch layer talks to the network exclusively through [`HttpTransport`].
//! The trait is deliberately narrow: the core only ever issues plain GET
//! requests for text bodies (proxied HTML or JSON envelopes). Racing, attempt
//! timeouts, and retries are the caller's concern, not the transport's.

use async_trait::async_trait;

use crate::error::Result;

/// Minimal HTTP capability required by the proxy fetch layer.
///
/// Implementations should handle:
/// - TLS certificate validation
/// - Connection pooling and keep-alive
/// - A generous safety-net timeout (the fetch layer applies its own
///   per-attempt deadline on top)
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::HttpTransport;
///
/// async fn fetch_page(transport: &dyn HttpTransport) -> Result<String> {
///     transport.get_text("https://example.com/page").await
/// }
/// ```
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET request and return the response body as text.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - The response status is not 2xx
    /// - The body is not valid UTF-8
    ///
    /// The fetch layer counts any `Err` as a failed proxy attempt.
    async fn get_text(&self, url: &str) -> Result<String>;
}
