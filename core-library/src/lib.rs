//! # Library Management Module
//!
//! Owns the player's track model, URL-based track identity, playlists, and the
//! in-memory caches that back browsing and lyrics lookups.
//!
//! ## Overview
//!
//! This module manages:
//! - The `Track` and `Playlist` domain models with validation
//! - URL normalization and normalized-URL track identity
//! - Named playlists plus the fixed, non-deletable favorites playlist
//! - The explore-listing cache (1 hour freshness) and the lyrics cache
//!   (indefinite, with a "confirmed no lyrics" sentinel)
//! - Search history and recents as bounded MRU lists
//! - Snapshot persistence through an injected [`bridge_traits::StateStore`]
//!
//! Stores here are plain in-memory structures mutated through `&mut self`;
//! callers sequence operations and decide when to persist. Nothing in this
//! crate performs network I/O.

pub mod error;
pub mod explore_cache;
pub mod history;
pub mod identity;
pub mod lyrics_cache;
pub mod models;
pub mod persistence;
pub mod playlists;

pub use error::{LibraryError, Result};
pub use explore_cache::ExploreCache;
pub use history::{RecentsStore, SearchHistory};
pub use identity::{is_same_track, normalize_url};
pub use lyrics_cache::LyricsCache;
pub use models::{Playlist, Track, FAVORITES_ID};
pub use persistence::{
    Persistence, PlaylistsSnapshot, RecentsSnapshot, SessionSnapshot,
};
pub use playlists::PlaylistStore;
