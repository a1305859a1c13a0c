//! Explore listing orchestration
//!
//! Cache-first reads over the hourly explore cache, with change detection so
//! callers can skip re-rendering an unchanged listing.

use crate::error::Result;
use bridge_traits::time::Clock;
use core_extract::extract_explore_items;
use core_fetch::ProxyFetcher;
use core_library::{ExploreCache, Track};
use core_runtime::config::SiteConfig;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of one explore call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreOutcome {
    pub items: Vec<Track>,
    /// Whether the listing differs from what the cache last held. A cache
    /// hit is by definition unchanged.
    pub changed: bool,
    /// Whether the items came from cache rather than the network.
    pub from_cache: bool,
}

/// Explore/browse listings with hourly cache freshness.
pub struct ExploreService {
    fetcher: Arc<ProxyFetcher>,
    cache: Arc<Mutex<ExploreCache>>,
    site: SiteConfig,
    clock: Arc<dyn Clock>,
}

impl ExploreService {
    pub fn new(
        fetcher: Arc<ProxyFetcher>,
        cache: Arc<Mutex<ExploreCache>>,
        site: SiteConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            site,
            clock,
        }
    }

    /// Load an explore listing, from cache when fresh.
    ///
    /// `force` skips the freshness check and always refetches. Non-empty
    /// listings are written back to the cache; an empty extraction is
    /// returned but never cached, so the next call tries the network again.
    pub async fn explore(&self, url: &str, force: bool) -> Result<ExploreOutcome> {
        let now = self.clock.unix_timestamp_millis();

        if !force {
            if let Some(items) = self.cache.lock().await.get(url, now) {
                debug!(url, items = items.len(), "Explore served from cache");
                return Ok(ExploreOutcome {
                    items,
                    changed: false,
                    from_cache: true,
                });
            }
        }

        let body = self.fetcher.fetch_content(url).await?;
        let items = extract_explore_items(&body, &self.site.origin, now)?;

        let mut cache = self.cache.lock().await;
        let changed = cache.listings_changed(url, &items);
        if !items.is_empty() {
            cache.put(url, items.clone(), now);
        }
        drop(cache);

        info!(url, items = items.len(), changed, "Explore listing refreshed");
        Ok(ExploreOutcome {
            items,
            changed,
            from_cache: false,
        })
    }

    /// Drop every cached listing.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}

impl std::fmt::Debug for ExploreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExploreService")
            .field("site", &self.site.origin)
            .finish_non_exhaustive()
    }
}
