//! Proxy race and retry loop

use crate::error::{FetchError, ProxyFailure, Result};
use bridge_traits::http::HttpTransport;
use core_runtime::config::{FetchConfig, ProxyEndpoint, ProxyResponseKind};
use core_runtime::logging::elide;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// JSON envelope returned by wrapping proxies.
#[derive(Debug, Deserialize)]
struct ProxyEnvelope {
    contents: String,
}

/// Fetches site pages through racing proxy backends.
///
/// One fetch call runs up to `1 + max_retries` rounds. A round launches every
/// configured proxy concurrently and resolves with the first successful body;
/// losing attempts keep running detached and their results are discarded.
/// Only the per-attempt timeout actually cancels an in-flight request.
pub struct ProxyFetcher {
    transport: Arc<dyn HttpTransport>,
    config: FetchConfig,
}

impl ProxyFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, config: FetchConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch a page through the proxies.
    ///
    /// # Returns
    /// The page body, envelope-unwrapped and guaranteed non-blank.
    ///
    /// # Errors
    /// - `NoProxiesConfigured` when the proxy list is empty
    /// - `AllProxiesFailed` only after every proxy has failed on every round
    pub async fn fetch_content(&self, url: &str) -> Result<String> {
        if self.config.proxies.is_empty() {
            return Err(FetchError::NoProxiesConfigured);
        }

        let rounds = self.config.max_retries + 1;
        let mut failures = Vec::new();

        for round in 0..rounds {
            if round > 0 {
                // Linear backoff: 500ms, then 1000ms, ...
                let delay = Duration::from_millis(self.config.retry_backoff_ms * round as u64);
                debug!(round, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                sleep(delay).await;
            }

            match self.race_once(url).await {
                Ok(body) => return Ok(body),
                Err(mut round_failures) => {
                    failures.append(&mut round_failures);
                }
            }
        }

        warn!(
            url,
            rounds,
            failures = failures.len(),
            last = %failures.last().map(ToString::to_string).unwrap_or_default(),
            "All proxies failed"
        );

        Err(FetchError::AllProxiesFailed {
            url: url.to_string(),
            rounds,
            failures,
        })
    }

    /// One race round: every proxy at once, first success wins.
    async fn race_once(&self, url: &str) -> std::result::Result<String, Vec<ProxyFailure>> {
        let mut in_flight = FuturesUnordered::new();

        for proxy in &self.config.proxies {
            let transport = Arc::clone(&self.transport);
            let proxy = proxy.clone();
            let target = url.to_string();
            let timeout_ms = self.config.attempt_timeout_ms;

            in_flight.push(tokio::spawn(async move {
                let outcome = attempt(transport.as_ref(), &proxy, &target, timeout_ms).await;
                (proxy.name, outcome)
            }));
        }

        let mut failures = Vec::new();

        while let Some(joined) = in_flight.next().await {
            let (proxy, outcome) = match joined {
                Ok(pair) => pair,
                Err(err) => {
                    failures.push(ProxyFailure {
                        proxy: "internal".to_string(),
                        reason: format!("attempt task failed: {}", err),
                    });
                    continue;
                }
            };

            match outcome {
                Ok(body) => {
                    debug!(proxy = %proxy, bytes = body.len(), "Proxy race won");
                    return Ok(body);
                }
                Err(reason) => {
                    debug!(proxy = %proxy, reason = %reason, "Proxy attempt failed");
                    failures.push(ProxyFailure { proxy, reason });
                }
            }
        }

        Err(failures)
    }
}

impl std::fmt::Debug for ProxyFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyFetcher")
            .field("proxies", &self.config.proxies.len())
            .field("attempt_timeout_ms", &self.config.attempt_timeout_ms)
            .finish()
    }
}

/// One attempt through one proxy, bounded by the timeout.
async fn attempt(
    transport: &dyn HttpTransport,
    proxy: &ProxyEndpoint,
    target: &str,
    timeout_ms: u64,
) -> std::result::Result<String, String> {
    let wrapped = proxy.wrap(target);
    debug!(proxy = %proxy.name, url = %elide(&wrapped, 96), "Proxy attempt");

    let body = match timeout(
        Duration::from_millis(timeout_ms),
        transport.get_text(&wrapped),
    )
    .await
    {
        Ok(Ok(body)) => body,
        Ok(Err(err)) => return Err(err.to_string()),
        Err(_) => return Err(format!("timed out after {}ms", timeout_ms)),
    };

    let content = match proxy.kind {
        ProxyResponseKind::JsonContents => {
            let envelope: ProxyEnvelope = serde_json::from_str(&body)
                .map_err(|err| format!("bad proxy envelope: {}", err))?;
            envelope.contents
        }
        ProxyResponseKind::Raw => body,
    };

    if content.trim().is_empty() {
        return Err("empty response body".to_string());
    }

    Ok(content)
}
