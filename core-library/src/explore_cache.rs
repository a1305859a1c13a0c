//! Explore-listing cache
//!
//! Listings fetched for browse/explore pages are kept for one hour, keyed by
//! normalized URL. Empty listings are never cached: an empty extraction is a
//! miss to retry, not a fact to remember. A change-detection helper lets the
//! caller skip re-rendering when a refetch produced the same listing.

use crate::identity::normalize_url;
use crate::models::Track;
use crate::persistence::{ExploreEntrySnapshot, ExploreSnapshot};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    items: Vec<Track>,
    stored_at_ms: i64,
}

/// TTL cache for explore listings.
///
/// Time is passed in by the caller (epoch milliseconds) so freshness is
/// deterministic under test.
#[derive(Debug, Clone)]
pub struct ExploreCache {
    entries: HashMap<String, CacheEntry>,
    ttl_ms: i64,
}

impl ExploreCache {
    /// Create an empty cache with the given freshness window.
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_ms,
        }
    }

    /// Items cached for this URL, if still fresh at `now_ms`.
    ///
    /// An entry written at time T is fresh while `now - T < ttl`.
    pub fn get(&self, url: &str, now_ms: i64) -> Option<Vec<Track>> {
        let key = normalize_url(url);
        let entry = self.entries.get(&key)?;
        let age_ms = now_ms - entry.stored_at_ms;

        if age_ms < self.ttl_ms {
            debug!(url = %key, age_ms, "Explore cache hit");
            Some(entry.items.clone())
        } else {
            debug!(url = %key, age_ms, "Explore cache entry expired");
            None
        }
    }

    /// Items cached for this URL regardless of freshness.
    ///
    /// Used for change detection, where a stale listing is still the right
    /// baseline to compare against.
    pub fn peek(&self, url: &str) -> Option<&[Track]> {
        self.entries
            .get(&normalize_url(url))
            .map(|entry| entry.items.as_slice())
    }

    /// Store a listing. Empty item sets are skipped.
    pub fn put(&mut self, url: &str, items: Vec<Track>, now_ms: i64) {
        if items.is_empty() {
            debug!(url, "Skipping explore cache write for empty listing");
            return;
        }

        let key = normalize_url(url);
        debug!(url = %key, items = items.len(), "Explore cache write");
        self.entries.insert(
            key,
            CacheEntry {
                items,
                stored_at_ms: now_ms,
            },
        );
    }

    /// Whether `new_items` differs from the cached listing for this URL.
    ///
    /// Listings match when they have the same length and the same
    /// (title, artist) pair at every index; anything else, including the
    /// absence of a cached listing, counts as changed. Staleness is ignored
    /// here on purpose.
    pub fn listings_changed(&self, url: &str, new_items: &[Track]) -> bool {
        let Some(cached) = self.peek(url) else {
            return true;
        };

        if cached.len() != new_items.len() {
            return true;
        }

        cached
            .iter()
            .zip(new_items.iter())
            .any(|(old, new)| old.title != new.title || old.artist != new.artist)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached listings (fresh or stale).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot every entry for persistence.
    pub fn to_snapshot(&self) -> ExploreSnapshot {
        self.entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    ExploreEntrySnapshot {
                        items: entry.items.clone(),
                        stored_at_ms: entry.stored_at_ms,
                    },
                )
            })
            .collect()
    }

    /// Rebuild a cache from a snapshot. Stale entries are kept; they expire
    /// naturally on the next `get`.
    pub fn from_snapshot(snapshot: ExploreSnapshot, ttl_ms: i64) -> Self {
        let entries = snapshot
            .into_iter()
            .filter(|(_, entry)| !entry.items.is_empty())
            .map(|(key, entry)| {
                (
                    key,
                    CacheEntry {
                        items: entry.items,
                        stored_at_ms: entry.stored_at_ms,
                    },
                )
            })
            .collect();

        Self { entries, ttl_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;

    fn listing() -> Vec<Track> {
        vec![
            Track::new(1, "Evening Rain", "Mara Lane", "https://music.example.com/song/1"),
            Track::new(2, "Low Tide", "Mara Lane", "https://music.example.com/song/2"),
        ]
    }

    #[test]
    fn test_entry_fresh_until_ttl() {
        let mut cache = ExploreCache::new(HOUR_MS);
        cache.put("https://music.example.com/explore", listing(), 1_000);

        // One millisecond inside the window: hit
        assert!(cache
            .get("https://music.example.com/explore", 1_000 + HOUR_MS - 1)
            .is_some());
        // One millisecond past the window: miss
        assert!(cache
            .get("https://music.example.com/explore", 1_000 + HOUR_MS + 1)
            .is_none());
    }

    #[test]
    fn test_never_caches_empty_listings() {
        let mut cache = ExploreCache::new(HOUR_MS);
        cache.put("https://music.example.com/explore", Vec::new(), 0);

        assert!(cache.is_empty());
        assert!(cache.get("https://music.example.com/explore", 0).is_none());
    }

    #[test]
    fn test_keys_are_normalized() {
        let mut cache = ExploreCache::new(HOUR_MS);
        cache.put("https://music.example.com/explore?page=1#top", listing(), 0);

        assert!(cache.get("https://music.example.com/explore", 10).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_peek_ignores_freshness() {
        let mut cache = ExploreCache::new(HOUR_MS);
        cache.put("https://music.example.com/explore", listing(), 0);

        assert!(cache.get("https://music.example.com/explore", HOUR_MS * 2).is_none());
        assert!(cache.peek("https://music.example.com/explore").is_some());
    }

    #[test]
    fn test_change_detection() {
        let mut cache = ExploreCache::new(HOUR_MS);
        let url = "https://music.example.com/explore";

        // Nothing cached yet: changed
        assert!(cache.listings_changed(url, &listing()));

        cache.put(url, listing(), 0);

        // Identical titles and artists, different ids and urls: unchanged
        let refetched = vec![
            Track::new(51, "Evening Rain", "Mara Lane", "https://music.example.com/song/1?r=1"),
            Track::new(52, "Low Tide", "Mara Lane", "https://music.example.com/song/2?r=1"),
        ];
        assert!(!cache.listings_changed(url, &refetched));

        // A retitled item is a change
        let retitled = vec![
            Track::new(51, "Morning Rain", "Mara Lane", "https://music.example.com/song/1"),
            Track::new(52, "Low Tide", "Mara Lane", "https://music.example.com/song/2"),
        ];
        assert!(cache.listings_changed(url, &retitled));

        // A different length is a change
        assert!(cache.listings_changed(url, &listing()[..1]));
    }

    #[test]
    fn test_clear() {
        let mut cache = ExploreCache::new(HOUR_MS);
        cache.put("https://music.example.com/explore", listing(), 0);
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get("https://music.example.com/explore", 1).is_none());
    }

    #[test]
    fn test_snapshot_round_trip_drops_nothing_fresh() {
        let mut cache = ExploreCache::new(HOUR_MS);
        cache.put("https://music.example.com/explore", listing(), 500);

        let restored = ExploreCache::from_snapshot(cache.to_snapshot(), HOUR_MS);
        assert_eq!(
            restored.get("https://music.example.com/explore", 600),
            cache.get("https://music.example.com/explore", 600)
        );
    }
}
