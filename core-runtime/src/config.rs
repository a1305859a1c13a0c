//! # Core Configuration Module
//!
//! Provides configuration management for the player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance holding the site conventions, proxy backends, and cache tuning the
//! core operates with. It enforces fail-fast validation so a misconfigured
//! proxy template or a zero TTL is caught at startup, not mid-playback.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .site_origin("https://music.example.com")
//!     .build()
//!     .expect("Failed to build config");
//!
//! assert_eq!(config.fetch.attempt_timeout_ms, 3_000);
//! ```
//!
//! ### Custom proxies and tuning
//!
//! ```
//! use core_runtime::config::{CoreConfig, ProxyEndpoint, ProxyResponseKind};
//!
//! let config = CoreConfig::builder()
//!     .site_origin("https://music.example.com")
//!     .proxies(vec![ProxyEndpoint::new(
//!         "mirror",
//!         "https://mirror.example.net/fetch?target={url}",
//!         ProxyResponseKind::Raw,
//!     )])
//!     .attempt_timeout_ms(5_000)
//!     .explore_ttl_ms(600_000)
//!     .build()
//!     .expect("Failed to build config");
//!
//! assert_eq!(config.fetch.proxies.len(), 1);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How a proxy backend returns the target page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyResponseKind {
    /// The proxy wraps the page in a JSON envelope: `{ "contents": "<html>" }`.
    JsonContents,
    /// The proxy returns the page body directly.
    Raw,
}

/// One CORS-bypass proxy backend.
///
/// The `template` contains a `{url}` placeholder that is replaced with the
/// percent-encoded target URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    /// Short name used in logs.
    pub name: String,
    /// URL template with a `{url}` placeholder.
    pub template: String,
    /// Envelope format of this backend's responses.
    pub kind: ProxyResponseKind,
}

impl ProxyEndpoint {
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        kind: ProxyResponseKind,
    ) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            kind,
        }
    }

    /// Expand the template for a target URL.
    pub fn wrap(&self, target: &str) -> String {
        self.template
            .replace("{url}", &urlencoding::encode(target))
    }
}

/// The scraped site's conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin all relative URLs resolve against, without a trailing slash
    /// (e.g. `https://music.example.com`).
    pub origin: String,
    /// Path of the search endpoint, with a leading slash.
    pub search_path: String,
    /// Substring identifying the site's download host in absolute URLs.
    /// Used by the direct-audio heuristics alongside file extensions.
    pub download_host_fragment: String,
}

impl SiteConfig {
    /// Build the search URL for a query string.
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}{}?q={}",
            self.origin,
            self.search_path,
            urlencoding::encode(query)
        )
    }
}

/// Fetch resilience tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Proxy backends raced on every fetch. The stock configuration carries
    /// two: a JSON-envelope backend and a raw-text backend.
    pub proxies: Vec<ProxyEndpoint>,
    /// Deadline for one attempt through one proxy, in milliseconds.
    pub attempt_timeout_ms: u64,
    /// How many times the whole proxy race is retried after the first round.
    pub max_retries: u32,
    /// Linear backoff unit between rounds: the wait before retry `n` is
    /// `retry_backoff_ms * n`.
    pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            proxies: vec![
                ProxyEndpoint::new(
                    "allorigins",
                    "https://api.allorigins.win/get?url={url}",
                    ProxyResponseKind::JsonContents,
                ),
                ProxyEndpoint::new(
                    "corsproxy",
                    "https://corsproxy.io/?{url}",
                    ProxyResponseKind::Raw,
                ),
            ],
            attempt_timeout_ms: 3_000,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// Cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Explore-listing freshness window in milliseconds.
    pub explore_ttl_ms: i64,
    /// Maximum number of remembered search queries.
    pub history_cap: usize,
    /// Maximum number of remembered recent tracks / recent playlists.
    pub recents_cap: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            explore_ttl_ms: 3_600_000,
            history_cap: 10,
            recents_cap: 20,
        }
    }
}

/// Core configuration for the player.
///
/// Use [`CoreConfig::builder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// The scraped site's conventions.
    pub site: SiteConfig,
    /// Fetch resilience tuning.
    pub fetch: FetchConfig,
    /// Cache tuning.
    pub cache: CacheConfig,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Site origin is present and uses http(s)
    /// - Search path starts with a slash
    /// - At least one proxy is configured and every template has a `{url}`
    ///   placeholder
    /// - Timeouts, retry counts, and cache bounds are within sane limits
    pub fn validate(&self) -> Result<()> {
        if self.site.origin.is_empty() {
            return Err(Error::Config("Site origin cannot be empty".to_string()));
        }

        if !self.site.origin.starts_with("http://") && !self.site.origin.starts_with("https://") {
            return Err(Error::Config(format!(
                "Site origin must start with http:// or https://, got '{}'",
                self.site.origin
            )));
        }

        if self.site.origin.ends_with('/') {
            return Err(Error::Config(
                "Site origin must not end with a slash".to_string(),
            ));
        }

        if !self.site.search_path.starts_with('/') {
            return Err(Error::Config(format!(
                "Search path must start with '/', got '{}'",
                self.site.search_path
            )));
        }

        if self.fetch.proxies.is_empty() {
            return Err(Error::Config(
                "At least one proxy backend is required. \
                 Use .proxies() to set them or keep the defaults."
                    .to_string(),
            ));
        }

        for proxy in &self.fetch.proxies {
            if !proxy.template.contains("{url}") {
                return Err(Error::Config(format!(
                    "Proxy '{}' template is missing the {{url}} placeholder",
                    proxy.name
                )));
            }
        }

        if self.fetch.attempt_timeout_ms == 0 {
            return Err(Error::Config(
                "Attempt timeout must be greater than 0ms".to_string(),
            ));
        }

        if self.fetch.attempt_timeout_ms > 60_000 {
            return Err(Error::Config(
                "Attempt timeout exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        if self.fetch.max_retries > 10 {
            return Err(Error::Config(
                "Retry count exceeds maximum of 10".to_string(),
            ));
        }

        if self.cache.explore_ttl_ms <= 0 {
            return Err(Error::Config(
                "Explore TTL must be greater than 0ms".to_string(),
            ));
        }

        if self.cache.history_cap == 0 {
            return Err(Error::Config(
                "Search history capacity must be greater than 0".to_string(),
            ));
        }

        if self.cache.recents_cap == 0 {
            return Err(Error::Config(
                "Recents capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then call
/// [`build()`](CoreConfigBuilder::build) to create the final config. The
/// builder validates the result and provides actionable error messages.
#[derive(Default)]
pub struct CoreConfigBuilder {
    site_origin: Option<String>,
    search_path: Option<String>,
    download_host_fragment: Option<String>,
    fetch: FetchConfig,
    cache: CacheConfig,
}

impl CoreConfigBuilder {
    /// Sets the site origin (required).
    ///
    /// A trailing slash is stripped so URL resolution can concatenate paths
    /// predictably.
    pub fn site_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        self.site_origin = Some(origin.trim_end_matches('/').to_string());
        self
    }

    /// Sets the search endpoint path.
    ///
    /// Default: `/search`
    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Sets the download-host fragment used by the direct-audio heuristics.
    ///
    /// Default: `download`
    pub fn download_host_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.download_host_fragment = Some(fragment.into());
        self
    }

    /// Replaces the proxy backend list.
    pub fn proxies(mut self, proxies: Vec<ProxyEndpoint>) -> Self {
        self.fetch.proxies = proxies;
        self
    }

    /// Sets the per-attempt timeout in milliseconds.
    ///
    /// Default: 3000ms
    pub fn attempt_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.fetch.attempt_timeout_ms = timeout_ms;
        self
    }

    /// Sets how many times the proxy race is retried.
    ///
    /// Default: 2
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.fetch.max_retries = retries;
        self
    }

    /// Sets the linear backoff unit between retry rounds.
    ///
    /// Default: 500ms
    pub fn retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.fetch.retry_backoff_ms = backoff_ms;
        self
    }

    /// Sets the explore cache freshness window in milliseconds.
    ///
    /// Default: 3,600,000ms (1 hour)
    pub fn explore_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.cache.explore_ttl_ms = ttl_ms;
        self
    }

    /// Sets the search history capacity.
    ///
    /// Default: 10
    pub fn history_cap(mut self, cap: usize) -> Self {
        self.cache.history_cap = cap;
        self
    }

    /// Sets the recent tracks / recent playlists capacity.
    ///
    /// Default: 20
    pub fn recents_cap(mut self, cap: usize) -> Self {
        self.cache.recents_cap = cap;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the site origin is missing or any value fails
    /// [`CoreConfig::validate`].
    pub fn build(self) -> Result<CoreConfig> {
        let origin = self.site_origin.ok_or_else(|| {
            Error::Config("Site origin is required. Use .site_origin() to set it.".to_string())
        })?;

        let config = CoreConfig {
            site: SiteConfig {
                origin,
                search_path: self.search_path.unwrap_or_else(|| "/search".to_string()),
                download_host_fragment: self
                    .download_host_fragment
                    .unwrap_or_else(|| "download".to_string()),
            },
            fetch: self.fetch,
            cache: self.cache,
        };

        config.validate()?;

        Ok(config)
    }
}
