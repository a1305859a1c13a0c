use std::fmt;
use thiserror::Error;

/// Why one proxy attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyFailure {
    /// The proxy's configured name.
    pub proxy: String,
    /// Human-readable failure reason.
    pub reason: String,
}

impl fmt::Display for ProxyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.proxy, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    /// Every proxy failed on every retry round.
    #[error("All proxies failed for {url} after {rounds} round(s)")]
    AllProxiesFailed {
        url: String,
        /// Rounds attempted (initial race plus retries).
        rounds: u32,
        /// Per-attempt failures across all rounds, in settle order.
        failures: Vec<ProxyFailure>,
    },

    /// The fetch layer was handed an empty proxy list.
    #[error("No proxy backends configured")]
    NoProxiesConfigured,
}

impl FetchError {
    /// Whether a later retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::AllProxiesFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
