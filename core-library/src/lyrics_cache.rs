//! Lyrics cache
//!
//! Lyrics are cached indefinitely, keyed by the track's normalized page URL
//! (`page_url` preferred, else `url`). A looked-up-but-absent result is stored
//! as an empty string so repeat visits don't refetch a page known to carry no
//! lyrics; that sentinel is distinct from a key that was never looked up.

use crate::identity::normalize_url;
use crate::models::Track;
use std::collections::HashMap;
use tracing::debug;

/// Unbounded lyrics cache.
#[derive(Debug, Clone, Default)]
pub struct LyricsCache {
    entries: HashMap<String, String>,
}

impl LyricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a track, when it has any URL at all.
    pub fn key_for(track: &Track) -> Option<String> {
        track.page_or_url().map(normalize_url)
    }

    /// Cached lyrics for a track.
    ///
    /// # Returns
    /// - `Some(text)` with non-empty text: cached lyrics
    /// - `Some("")`: looked before, confirmed no lyrics
    /// - `None`: never looked (or the track has no URL)
    pub fn get(&self, track: &Track) -> Option<&str> {
        let key = Self::key_for(track)?;
        self.entries.get(&key).map(String::as_str)
    }

    /// Store lyrics for a track.
    pub fn put(&mut self, track: &Track, lyrics: impl Into<String>) {
        if let Some(key) = Self::key_for(track) {
            debug!(url = %key, "Lyrics cache write");
            self.entries.insert(key, lyrics.into());
        }
    }

    /// Record that this track's page holds no lyrics.
    pub fn put_missing(&mut self, track: &Track) {
        self.put(track, "");
    }

    /// Forget one track's entry so the next lookup refetches.
    pub fn invalidate(&mut self, track: &Track) {
        if let Some(key) = Self::key_for(track) {
            self.entries.remove(&key);
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot for persistence.
    pub fn to_snapshot(&self) -> HashMap<String, String> {
        self.entries.clone()
    }

    /// Rebuild from a snapshot.
    pub fn from_snapshot(snapshot: HashMap<String, String>) -> Self {
        Self { entries: snapshot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track::new(1, "Evening Rain", "Mara Lane", "https://cdn.example.com/files/1.mp3")
            .with_page_url("https://music.example.com/song/1")
    }

    #[test]
    fn test_key_prefers_page_url() {
        assert_eq!(
            LyricsCache::key_for(&track()).as_deref(),
            Some("https://music.example.com/song/1")
        );

        let url_only = Track::new(2, "Low Tide", "", "https://music.example.com/song/2?x=1");
        assert_eq!(
            LyricsCache::key_for(&url_only).as_deref(),
            Some("https://music.example.com/song/2")
        );

        let no_urls = Track::new(3, "Ghost", "", "");
        assert_eq!(LyricsCache::key_for(&no_urls), None);
    }

    #[test]
    fn test_no_lyrics_sentinel_is_distinct_from_unknown() {
        let mut cache = LyricsCache::new();
        let track = track();

        // Never looked
        assert_eq!(cache.get(&track), None);

        // Looked, found nothing
        cache.put_missing(&track);
        assert_eq!(cache.get(&track), Some(""));

        // Looked, found lyrics
        cache.put(&track, "Rain on the window\nAll night long");
        assert_eq!(cache.get(&track), Some("Rain on the window\nAll night long"));
    }

    #[test]
    fn test_lookup_matches_across_refetches() {
        let mut cache = LyricsCache::new();
        cache.put(&track(), "Rain on the window");

        // Same page, different id and query string
        let refetched = Track::new(88, "Evening Rain", "", "https://music.example.com/song/1?hl=en");
        assert_eq!(cache.get(&refetched), Some("Rain on the window"));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = LyricsCache::new();
        cache.put(&track(), "Rain on the window");

        cache.invalidate(&track());
        assert_eq!(cache.get(&track()), None);

        cache.put_missing(&track());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&track()), None);
    }

    #[test]
    fn test_snapshot_round_trip_keeps_sentinels() {
        let mut cache = LyricsCache::new();
        cache.put(&track(), "Rain on the window");
        let silent = Track::new(2, "Low Tide", "", "https://music.example.com/song/2");
        cache.put_missing(&silent);

        let restored = LyricsCache::from_snapshot(cache.to_snapshot());
        assert_eq!(restored.get(&track()), Some("Rain on the window"));
        assert_eq!(restored.get(&silent), Some(""));
    }
}
