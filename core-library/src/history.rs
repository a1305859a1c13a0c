//! Search history and recents
//!
//! Both are bounded most-recent-first lists. Search history dedupes by exact
//! string match; recent tracks dedupe by normalized-URL identity so a
//! refetched copy of a track moves the existing entry to the front instead of
//! duplicating it.

use crate::models::Track;

/// Bounded MRU list of raw search queries.
#[derive(Debug, Clone)]
pub struct SearchHistory {
    queries: Vec<String>,
    cap: usize,
}

impl SearchHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            queries: Vec::new(),
            cap,
        }
    }

    /// Record a query as the most recent. Blank queries are ignored; an
    /// existing identical query moves to the front.
    pub fn push(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        if let Some(position) = self.queries.iter().position(|q| q == query) {
            self.queries.remove(position);
        }

        self.queries.insert(0, query.to_string());
        self.queries.truncate(self.cap);
    }

    /// Queries, most recent first.
    pub fn list(&self) -> &[String] {
        &self.queries
    }

    /// Remove a single query.
    ///
    /// # Returns
    /// Whether the query was present.
    pub fn remove(&mut self, query: &str) -> bool {
        match self.queries.iter().position(|q| q == query) {
            Some(position) => {
                self.queries.remove(position);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.queries.clear();
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Snapshot for persistence.
    pub fn to_snapshot(&self) -> Vec<String> {
        self.queries.clone()
    }

    /// Rebuild from a snapshot, clamped to the capacity.
    pub fn from_snapshot(mut queries: Vec<String>, cap: usize) -> Self {
        queries.truncate(cap);
        Self { queries, cap }
    }
}

/// Bounded MRU lists of recently played tracks and recently opened playlists.
#[derive(Debug, Clone)]
pub struct RecentsStore {
    recent_tracks: Vec<Track>,
    recent_playlists: Vec<i64>,
    cap: usize,
}

impl RecentsStore {
    pub fn new(cap: usize) -> Self {
        Self {
            recent_tracks: Vec::new(),
            recent_playlists: Vec::new(),
            cap,
        }
    }

    /// Rebuild from persisted lists, clamped to the capacity.
    pub fn from_parts(mut tracks: Vec<Track>, mut playlists: Vec<i64>, cap: usize) -> Self {
        tracks.truncate(cap);
        playlists.truncate(cap);
        Self {
            recent_tracks: tracks,
            recent_playlists: playlists,
            cap,
        }
    }

    /// Record a played track as most recent (identity-deduplicated).
    pub fn record_track(&mut self, track: Track) {
        if let Some(position) = self.recent_tracks.iter().position(|t| t.is_same(&track)) {
            self.recent_tracks.remove(position);
        }

        self.recent_tracks.insert(0, track);
        self.recent_tracks.truncate(self.cap);
    }

    /// Record an opened playlist as most recent.
    pub fn record_playlist(&mut self, playlist_id: i64) {
        self.recent_playlists.retain(|&id| id != playlist_id);
        self.recent_playlists.insert(0, playlist_id);
        self.recent_playlists.truncate(self.cap);
    }

    /// Drop a playlist from recents (after deletion).
    pub fn prune_playlist(&mut self, playlist_id: i64) {
        self.recent_playlists.retain(|&id| id != playlist_id);
    }

    /// Recently played tracks, most recent first.
    pub fn recent_tracks(&self) -> &[Track] {
        &self.recent_tracks
    }

    /// Recently opened playlist ids, most recent first.
    pub fn recent_playlists(&self) -> &[i64] {
        &self.recent_playlists
    }

    pub fn clear(&mut self) {
        self.recent_tracks.clear();
        self.recent_playlists.clear();
    }
}
