//! Lyrics orchestration
//!
//! Sentinel-aware cache-first lookup: a cached empty string means the page
//! was already checked and holds no lyrics, so repeat visits stay off the
//! network until the user forces a reload.

use crate::error::Result;
use core_extract::extract_lyrics;
use core_fetch::ProxyFetcher;
use core_library::{LyricsCache, Track};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Lyrics lookup over the indefinitely-retained lyrics cache.
pub struct LyricsService {
    fetcher: Arc<ProxyFetcher>,
    cache: Arc<Mutex<LyricsCache>>,
}

impl LyricsService {
    pub fn new(fetcher: Arc<ProxyFetcher>, cache: Arc<Mutex<LyricsCache>>) -> Self {
        Self { fetcher, cache }
    }

    /// Lyrics for a track, fetching the song page on a cache miss.
    ///
    /// # Returns
    /// - `Ok(Some(text))` when lyrics exist, from cache or freshly extracted
    /// - `Ok(None)` when the page holds no lyrics; this outcome is cached so
    ///   the next call answers without fetching
    ///
    /// `force` drops the cached value first, re-checking the page even after
    /// a confirmed "no lyrics".
    pub async fn lyrics_for(&self, track: &Track, force: bool) -> Result<Option<String>> {
        if force {
            self.cache.lock().await.invalidate(track);
        }

        let cached = self.cache.lock().await.get(track).map(ToString::to_string);
        if let Some(text) = cached {
            debug!(
                title = %track.title,
                confirmed_missing = text.is_empty(),
                "Lyrics served from cache"
            );
            return Ok(if text.is_empty() { None } else { Some(text) });
        }

        let Some(target) = track.page_or_url() else {
            warn!(title = %track.title, "Track has no page to resolve lyrics from");
            return Ok(None);
        };

        let body = self.fetcher.fetch_content(target).await?;
        let lyrics = extract_lyrics(&body)?;

        let mut cache = self.cache.lock().await;
        match &lyrics {
            Some(text) => cache.put(track, text.as_str()),
            None => cache.put_missing(track),
        }
        drop(cache);

        info!(title = %track.title, found = lyrics.is_some(), "Lyrics lookup complete");
        Ok(lyrics)
    }

    /// Forget every cached lyrics entry, including "no lyrics" sentinels.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}

impl std::fmt::Debug for LyricsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyricsService").finish_non_exhaustive()
    }
}
