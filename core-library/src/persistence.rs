//! Snapshot persistence
//!
//! Every durable piece of player state (session, playlists, recents, lyrics
//! cache, explore cache) is serialized as a plain JSON record and written
//! through an injected [`StateStore`]. An unreadable snapshot is discarded
//! with a warning rather than failing startup: losing a cache or session is
//! recoverable, refusing to start is not.

use crate::error::Result;
use crate::models::{Playlist, Track};
use bridge_traits::storage::StateStore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key for the playback session snapshot.
pub const KEY_SESSION: &str = "player.session";
/// Storage key for the playlists snapshot.
pub const KEY_PLAYLISTS: &str = "player.playlists";
/// Storage key for the recents / search-history bundle.
pub const KEY_RECENTS: &str = "player.recents";
/// Storage key for the lyrics cache map.
pub const KEY_LYRICS: &str = "player.lyrics";
/// Storage key for the explore cache map.
pub const KEY_EXPLORE: &str = "player.explore";

// =============================================================================
// Snapshot records
// =============================================================================

/// Persisted playback session: the active playlist plus mode flags.
///
/// `current_index` uses `-1` for "no track selected" in the stored form; the
/// in-memory session models that as `Option<usize>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tracks: Vec<Track>,
    pub current_index: i64,
    #[serde(default)]
    pub shuffle: bool,
    /// Repeat mode as `"off"`, `"one"`, or `"all"`.
    #[serde(default = "default_repeat")]
    pub repeat: String,
}

fn default_repeat() -> String {
    "off".to_string()
}

/// Persisted playlists plus the id counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistsSnapshot {
    pub playlists: Vec<Playlist>,
    pub next_id: i64,
}

/// Persisted recents bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecentsSnapshot {
    #[serde(default)]
    pub recent_tracks: Vec<Track>,
    #[serde(default)]
    pub recent_playlists: Vec<i64>,
    #[serde(default)]
    pub search_history: Vec<String>,
}

/// One persisted explore cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreEntrySnapshot {
    pub items: Vec<Track>,
    pub stored_at_ms: i64,
}

/// Persisted explore cache, keyed by normalized URL.
pub type ExploreSnapshot = HashMap<String, ExploreEntrySnapshot>;

// =============================================================================
// Persistence
// =============================================================================

/// Typed load/save operations over a [`StateStore`].
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn StateStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn load_session(&self) -> Result<Option<SessionSnapshot>> {
        self.load(KEY_SESSION).await
    }

    pub async fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.save(KEY_SESSION, snapshot).await
    }

    pub async fn load_playlists(&self) -> Result<Option<PlaylistsSnapshot>> {
        self.load(KEY_PLAYLISTS).await
    }

    pub async fn save_playlists(&self, snapshot: &PlaylistsSnapshot) -> Result<()> {
        self.save(KEY_PLAYLISTS, snapshot).await
    }

    pub async fn load_recents(&self) -> Result<Option<RecentsSnapshot>> {
        self.load(KEY_RECENTS).await
    }

    pub async fn save_recents(&self, snapshot: &RecentsSnapshot) -> Result<()> {
        self.save(KEY_RECENTS, snapshot).await
    }

    pub async fn load_lyrics(&self) -> Result<Option<HashMap<String, String>>> {
        self.load(KEY_LYRICS).await
    }

    pub async fn save_lyrics(&self, snapshot: &HashMap<String, String>) -> Result<()> {
        self.save(KEY_LYRICS, snapshot).await
    }

    pub async fn load_explore(&self) -> Result<Option<ExploreSnapshot>> {
        self.load(KEY_EXPLORE).await
    }

    pub async fn save_explore(&self, snapshot: &ExploreSnapshot) -> Result<()> {
        self.save(KEY_EXPLORE, snapshot).await
    }

    /// Remove every player key from the store.
    pub async fn clear_all(&self) -> Result<()> {
        for key in [KEY_SESSION, KEY_PLAYLISTS, KEY_RECENTS, KEY_LYRICS, KEY_EXPLORE] {
            self.store.remove(key).await?;
        }
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                // A snapshot that no longer parses is treated as absent
                warn!(key, error = %err, "Discarding unreadable snapshot");
                Ok(None)
            }
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        debug!(key, bytes = raw.len(), "Persisting snapshot");
        self.store.set(key, &raw).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}
