//! Playlist store: named collections plus the fixed favorites playlist
//!
//! Favorites is created on first use, always present, and cannot be renamed
//! or deleted. Custom playlists get ids from a monotonic counter that is
//! persisted with the snapshot so ids stay unique across restarts.

use crate::error::{LibraryError, Result};
use crate::models::{Playlist, Track, FAVORITES_ID};
use crate::persistence::PlaylistsSnapshot;
use tracing::debug;

/// Default display name of the favorites playlist.
pub const FAVORITES_NAME: &str = "Favorites";

/// In-memory playlist store.
///
/// Mutations validate first and fail without side effects. Duplicate-track
/// checks use normalized-URL identity, never track ids.
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    favorites: Playlist,
    customs: Vec<Playlist>,
    next_id: i64,
}

impl PlaylistStore {
    /// Create a store holding only an empty favorites playlist.
    pub fn new() -> Self {
        Self {
            favorites: Playlist::new(FAVORITES_ID, FAVORITES_NAME),
            customs: Vec::new(),
            next_id: FAVORITES_ID + 1,
        }
    }

    /// Rebuild a store from a persisted snapshot.
    ///
    /// Missing favorites are recreated empty; the id counter is bumped past
    /// every restored id so a corrupt counter cannot hand out duplicates.
    pub fn from_snapshot(snapshot: PlaylistsSnapshot) -> Self {
        let mut favorites = None;
        let mut customs = Vec::new();

        for playlist in snapshot.playlists {
            if playlist.id == FAVORITES_ID && favorites.is_none() {
                favorites = Some(playlist);
            } else if playlist.id != FAVORITES_ID {
                customs.push(playlist);
            }
        }

        let max_id = customs.iter().map(|p| p.id).max().unwrap_or(FAVORITES_ID);
        let next_id = snapshot.next_id.max(max_id + 1).max(FAVORITES_ID + 1);

        debug!(
            customs = customs.len(),
            next_id, "Restored playlists from snapshot"
        );

        Self {
            favorites: favorites
                .unwrap_or_else(|| Playlist::new(FAVORITES_ID, FAVORITES_NAME)),
            customs,
            next_id,
        }
    }

    /// Snapshot the store for persistence (favorites first).
    pub fn to_snapshot(&self) -> PlaylistsSnapshot {
        let mut playlists = Vec::with_capacity(1 + self.customs.len());
        playlists.push(self.favorites.clone());
        playlists.extend(self.customs.iter().cloned());

        PlaylistsSnapshot {
            playlists,
            next_id: self.next_id,
        }
    }

    /// The favorites playlist.
    pub fn favorites(&self) -> &Playlist {
        &self.favorites
    }

    /// Custom playlists in creation order.
    pub fn customs(&self) -> &[Playlist] {
        &self.customs
    }

    /// All playlists, favorites first.
    pub fn all(&self) -> impl Iterator<Item = &Playlist> {
        std::iter::once(&self.favorites).chain(self.customs.iter())
    }

    /// Find a playlist by id.
    pub fn get(&self, id: i64) -> Option<&Playlist> {
        if id == FAVORITES_ID {
            Some(&self.favorites)
        } else {
            self.customs.iter().find(|p| p.id == id)
        }
    }

    /// Total number of playlists, favorites included.
    pub fn len(&self) -> usize {
        1 + self.customs.len()
    }

    /// Always false: favorites exists from first use.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Create a new custom playlist.
    ///
    /// # Returns
    /// The id of the new playlist.
    ///
    /// # Errors
    /// - `InvalidInput` for a blank name
    /// - `DuplicateName` when a playlist with the same name (case-insensitive,
    ///   trimmed) already exists
    pub fn create(&mut self, name: impl Into<String>) -> Result<i64> {
        let name = name.into();
        let candidate = Playlist::new(self.next_id, name.trim());
        candidate.validate().map_err(|e| LibraryError::InvalidInput {
            field: "name".to_string(),
            message: e,
        })?;

        if self.name_taken(&candidate.name, None) {
            return Err(LibraryError::DuplicateName(candidate.name));
        }

        let id = candidate.id;
        self.customs.push(candidate);
        self.next_id += 1;

        debug!(playlist_id = id, name = %name.trim(), "Created playlist");
        Ok(id)
    }

    /// Rename a custom playlist.
    ///
    /// # Errors
    /// - `FavoritesImmutable` for the favorites playlist
    /// - `NotFound` for an unknown id
    /// - `InvalidInput` / `DuplicateName` as for [`create`](Self::create)
    pub fn rename(&mut self, id: i64, new_name: impl Into<String>) -> Result<()> {
        if id == FAVORITES_ID {
            return Err(LibraryError::FavoritesImmutable);
        }

        let new_name = new_name.into().trim().to_string();
        if new_name.is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "name".to_string(),
                message: "Playlist name cannot be empty".to_string(),
            });
        }

        if self.name_taken(&new_name, Some(id)) {
            return Err(LibraryError::DuplicateName(new_name));
        }

        let playlist = self.get_custom_mut(id)?;
        playlist.name = new_name;
        Ok(())
    }

    /// Delete a custom playlist.
    ///
    /// # Errors
    /// - `FavoritesImmutable` for the favorites playlist
    /// - `NotFound` for an unknown id
    pub fn delete(&mut self, id: i64) -> Result<()> {
        if id == FAVORITES_ID {
            return Err(LibraryError::FavoritesImmutable);
        }

        let position = self
            .customs
            .iter()
            .position(|p| p.id == id)
            .ok_or(LibraryError::NotFound {
                entity_type: "Playlist".to_string(),
                id,
            })?;

        let removed = self.customs.remove(position);
        debug!(playlist_id = id, name = %removed.name, "Deleted playlist");
        Ok(())
    }

    /// Add a track to a playlist.
    ///
    /// # Errors
    /// - `NotFound` for an unknown playlist id
    /// - `InvalidInput` when the track fails validation
    /// - `DuplicateTrack` when the playlist already holds the same track
    ///   (normalized-URL identity)
    pub fn add_track(&mut self, id: i64, track: Track) -> Result<()> {
        track.validate().map_err(|e| LibraryError::InvalidInput {
            field: "track".to_string(),
            message: e,
        })?;

        let playlist = self.get_any_mut(id)?;
        if playlist.contains(&track) {
            return Err(LibraryError::DuplicateTrack);
        }

        playlist.tracks.push(track);
        Ok(())
    }

    /// Remove a track from a playlist by identity.
    ///
    /// # Returns
    /// - `Ok(true)` if a matching track was removed
    /// - `Ok(false)` if the playlist did not hold the track
    pub fn remove_track(&mut self, id: i64, track: &Track) -> Result<bool> {
        let playlist = self.get_any_mut(id)?;
        match playlist.position_of(track) {
            Some(position) => {
                playlist.tracks.remove(position);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Mark a playlist as downloaded (or not).
    pub fn set_downloaded(&mut self, id: i64, downloaded: bool) -> Result<()> {
        let playlist = self.get_any_mut(id)?;
        playlist.downloaded = downloaded;
        Ok(())
    }

    /// Whether the track is in favorites.
    pub fn is_favorite(&self, track: &Track) -> bool {
        self.favorites.contains(track)
    }

    /// Add the track to favorites, or remove it when already present.
    ///
    /// # Returns
    /// Whether the track is a favorite after the call.
    pub fn toggle_favorite(&mut self, track: Track) -> Result<bool> {
        if let Some(position) = self.favorites.position_of(&track) {
            self.favorites.tracks.remove(position);
            return Ok(false);
        }

        track.validate().map_err(|e| LibraryError::InvalidInput {
            field: "track".to_string(),
            message: e,
        })?;
        self.favorites.tracks.push(track);
        Ok(true)
    }

    fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> bool {
        let wanted = name.trim().to_lowercase();
        self.all().any(|p| {
            Some(p.id) != exclude_id && p.name.trim().to_lowercase() == wanted
        })
    }

    fn get_any_mut(&mut self, id: i64) -> Result<&mut Playlist> {
        if id == FAVORITES_ID {
            return Ok(&mut self.favorites);
        }
        self.get_custom_mut(id)
    }

    fn get_custom_mut(&mut self, id: i64) -> Result<&mut Playlist> {
        self.customs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(LibraryError::NotFound {
                entity_type: "Playlist".to_string(),
                id,
            })
    }
}

impl Default for PlaylistStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64, title: &str, url: &str) -> Track {
        Track::new(id, title, "Mara Lane", url)
    }

    #[test]
    fn test_new_store_has_favorites_only() {
        let store = PlaylistStore::new();
        assert_eq!(store.len(), 1);
        assert_eq!(store.favorites().name, FAVORITES_NAME);
        assert!(store.favorites().tracks.is_empty());
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut store = PlaylistStore::new();
        let first = store.create("Road Trip").unwrap();
        let second = store.create("Focus").unwrap();

        assert_eq!(first, FAVORITES_ID + 1);
        assert_eq!(second, FAVORITES_ID + 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_create_rejects_blank_and_duplicate_names() {
        let mut store = PlaylistStore::new();
        store.create("Road Trip").unwrap();

        assert!(matches!(
            store.create("   "),
            Err(LibraryError::InvalidInput { .. })
        ));
        assert!(matches!(
            store.create("road trip "),
            Err(LibraryError::DuplicateName(_))
        ));
        assert!(matches!(
            store.create("favorites"),
            Err(LibraryError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_favorites_cannot_be_renamed_or_deleted() {
        let mut store = PlaylistStore::new();

        assert!(matches!(
            store.rename(FAVORITES_ID, "Mine"),
            Err(LibraryError::FavoritesImmutable)
        ));
        assert!(matches!(
            store.delete(FAVORITES_ID),
            Err(LibraryError::FavoritesImmutable)
        ));
    }

    #[test]
    fn test_rename_and_delete_custom_playlist() {
        let mut store = PlaylistStore::new();
        let id = store.create("Road Trip").unwrap();

        store.rename(id, "Long Drive").unwrap();
        assert_eq!(store.get(id).unwrap().name, "Long Drive");

        store.delete(id).unwrap();
        assert!(store.get(id).is_none());
        assert!(matches!(
            store.delete(id),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_track_rejects_duplicates_by_identity() {
        let mut store = PlaylistStore::new();
        let id = store.create("Road Trip").unwrap();

        store
            .add_track(id, track(1, "Evening Rain", "https://music.example.com/song/1"))
            .unwrap();

        // Same page refetched with a new id and a tracking query
        let refetched = track(77, "Evening Rain", "https://music.example.com/song/1?ref=explore");
        assert!(matches!(
            store.add_track(id, refetched),
            Err(LibraryError::DuplicateTrack)
        ));
        assert_eq!(store.get(id).unwrap().tracks.len(), 1);
    }

    #[test]
    fn test_remove_track_by_identity() {
        let mut store = PlaylistStore::new();
        let id = store.create("Road Trip").unwrap();
        store
            .add_track(id, track(1, "Evening Rain", "https://music.example.com/song/1"))
            .unwrap();

        let lookalike = track(50, "Evening Rain", "https://music.example.com/song/1#t=10");
        assert!(store.remove_track(id, &lookalike).unwrap());
        assert!(!store.remove_track(id, &lookalike).unwrap());
        assert!(store.get(id).unwrap().tracks.is_empty());
    }

    #[test]
    fn test_toggle_favorite_round_trip() {
        let mut store = PlaylistStore::new();
        let original = track(1, "Evening Rain", "https://music.example.com/song/1");

        assert!(!store.is_favorite(&original));
        assert!(store.toggle_favorite(original.clone()).unwrap());
        assert!(store.is_favorite(&original));

        // Toggling again with a refetched copy restores the original state
        let refetched = track(99, "Evening Rain", "https://music.example.com/song/1?x=1");
        assert!(!store.toggle_favorite(refetched).unwrap());
        assert!(!store.is_favorite(&original));
        assert!(store.favorites().tracks.is_empty());
    }

    #[test]
    fn test_set_downloaded() {
        let mut store = PlaylistStore::new();
        let id = store.create("Road Trip").unwrap();

        store.set_downloaded(id, true).unwrap();
        assert!(store.get(id).unwrap().downloaded);
    }

    #[test]
    fn test_snapshot_round_trip_preserves_counter() {
        let mut store = PlaylistStore::new();
        let id = store.create("Road Trip").unwrap();
        store
            .add_track(id, track(1, "Evening Rain", "https://music.example.com/song/1"))
            .unwrap();
        store.delete(id).unwrap();

        let mut restored = PlaylistStore::from_snapshot(store.to_snapshot());

        // The deleted playlist's id is never reused
        let fresh = restored.create("Focus").unwrap();
        assert!(fresh > id);
    }

    #[test]
    fn test_from_snapshot_recreates_missing_favorites() {
        let snapshot = PlaylistsSnapshot {
            playlists: vec![Playlist::new(5, "Road Trip")],
            next_id: 3,
        };

        let mut store = PlaylistStore::from_snapshot(snapshot);
        assert_eq!(store.favorites().name, FAVORITES_NAME);
        assert_eq!(store.customs().len(), 1);

        // Counter is bumped past every restored id
        let id = store.create("Focus").unwrap();
        assert_eq!(id, 6);
    }
}
