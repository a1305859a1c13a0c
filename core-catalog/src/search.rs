//! Search orchestration
//!
//! Validates the query, records it in the MRU history, fetches the site's
//! search page through the proxies, and extracts a [`SearchPage`]. An
//! unparseable page degrades to the placeholder row instead of failing.

use crate::error::{CatalogError, Result};
use bridge_traits::time::Clock;
use core_extract::{extract_search_results, SearchPage};
use core_fetch::ProxyFetcher;
use core_library::SearchHistory;
use core_runtime::config::SiteConfig;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Site search driven through the proxy fetcher.
pub struct SearchService {
    fetcher: Arc<ProxyFetcher>,
    history: Arc<Mutex<SearchHistory>>,
    site: SiteConfig,
    clock: Arc<dyn Clock>,
}

impl SearchService {
    pub fn new(
        fetcher: Arc<ProxyFetcher>,
        history: Arc<Mutex<SearchHistory>>,
        site: SiteConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            history,
            site,
            clock,
        }
    }

    /// Run a search and extract its result page.
    ///
    /// The query lands in the search history before the fetch, so a failed
    /// search can still be retried from the history list.
    ///
    /// # Errors
    /// - `EmptyQuery` for a blank query, before any I/O
    /// - `Fetch` when every proxy fails
    pub async fn search(&self, query: &str) -> Result<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::EmptyQuery);
        }

        self.history.lock().await.push(query);

        let url = self.site.search_url(query);
        debug!(query, "Searching");
        let body = self.fetcher.fetch_content(&url).await?;

        let page = extract_search_results(
            &body,
            &self.site.origin,
            self.clock.unix_timestamp_millis(),
        )?;
        info!(
            query,
            results = page.tracks.len(),
            has_more = page.has_more,
            "Search complete"
        );
        Ok(page)
    }

    /// Recent queries, most recent first.
    pub async fn recent_queries(&self) -> Vec<String> {
        self.history.lock().await.list().to_vec()
    }

    /// Remove one remembered query.
    pub async fn remove_recent_query(&self, query: &str) -> bool {
        self.history.lock().await.remove(query)
    }

    /// Forget the whole search history.
    pub async fn clear_recent_queries(&self) {
        self.history.lock().await.clear();
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("site", &self.site.origin)
            .finish_non_exhaustive()
    }
}
