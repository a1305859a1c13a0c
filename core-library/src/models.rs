//! Domain models for the player library
//!
//! This module contains the track and playlist records with validation. Track
//! identity is by normalized URL (see [`crate::identity`]); ids are process
//! ephemera and must never be used for deduplication.

use crate::identity::is_same_track;
use serde::{Deserialize, Serialize};

/// Fixed id of the favorites playlist. It exists from first use and can be
/// neither renamed nor deleted.
pub const FAVORITES_ID: i64 = 1;

// =============================================================================
// Track
// =============================================================================

/// A playable track scraped from the site.
///
/// `url` is either a direct audio resource or a page to resolve; `page_url`,
/// when present, is the fallback resolution target for tracks whose `url` is
/// already a direct audio link.
///
/// `id` is derived from a timestamp plus the track's position in its source
/// listing. It is unique within one extracted batch but NOT a stable identity:
/// two fetches of the same track may yield different ids. Equality checks go
/// through [`is_same_track`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Process-unique id (time + index derived, unstable across fetches)
    pub id: i64,
    /// Track title
    pub title: String,
    /// Artist name, empty when the listing carried none
    #[serde(default)]
    pub artist: String,
    /// Cover image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Direct audio resource or a page to resolve
    pub url: String,
    /// Fallback resolution target
    #[serde(default)]
    pub page_url: Option<String>,
}

impl Track {
    /// Create a track with the required fields.
    pub fn new(
        id: i64,
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            image: None,
            url: url.into(),
            page_url: None,
        }
    }

    /// Set the cover image URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the fallback page URL.
    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = Some(page_url.into());
        self
    }

    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Track title cannot be empty".to_string());
        }

        if self.url.trim().is_empty() && !self.has_page_url() {
            return Err("Track needs a url or a page_url".to_string());
        }

        Ok(())
    }

    /// The page this track's lyrics and audio can be (re)resolved from:
    /// `page_url` when present, otherwise `url`.
    pub fn page_or_url(&self) -> Option<&str> {
        match self.page_url.as_deref() {
            Some(page) if !page.trim().is_empty() => Some(page),
            _ if !self.url.trim().is_empty() => Some(&self.url),
            _ => None,
        }
    }

    /// Whether this track is the same site entity as `other`.
    ///
    /// Compares normalized URLs, never ids.
    pub fn is_same(&self, other: &Track) -> bool {
        is_same_track(self, other)
    }

    fn has_page_url(&self) -> bool {
        self.page_url
            .as_deref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false)
    }
}

// =============================================================================
// Playlist
// =============================================================================

/// A named, ordered collection of tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Store-assigned id ([`FAVORITES_ID`] for the favorites playlist)
    pub id: i64,
    /// Display name
    pub name: String,
    /// Tracks in user order
    pub tracks: Vec<Track>,
    /// Whether the playlist's audio has been fetched for offline use
    #[serde(default)]
    pub downloaded: bool,
}

impl Playlist {
    /// Create an empty playlist.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tracks: Vec::new(),
            downloaded: false,
        }
    }

    /// Whether this is the fixed favorites playlist.
    pub fn is_favorites(&self) -> bool {
        self.id == FAVORITES_ID
    }

    /// Whether the playlist already holds this track (by normalized URL).
    pub fn contains(&self, track: &Track) -> bool {
        self.position_of(track).is_some()
    }

    /// Position of this track in the playlist (by normalized URL).
    pub fn position_of(&self, track: &Track) -> Option<usize> {
        self.tracks.iter().position(|t| t.is_same(track))
    }

    /// Validate playlist data
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Playlist name cannot be empty".to_string());
        }

        Ok(())
    }
}
