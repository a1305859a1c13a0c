//! # Core Service Module
//!
//! Assembles the player core from host-provided bridges and exposes it as a
//! single facade. The host hands over an HTTP transport, an audio sink, a
//! warmup cache, a state store, and a clock; [`PlayerCore`] wires them into
//! the proxy fetcher, the catalog services, the library stores, the playback
//! engine, and the persistence layer, and keeps the persisted snapshots in
//! step with every state-changing call.
//!
//! ## Overview
//!
//! - Search, explore, and lyrics lookups delegate to the catalog services
//!   and write back the caches they touched.
//! - Playback calls drive the engine, record recently played tracks, and
//!   persist the session after every change.
//! - Playlist and favorites edits go through the library store, emit
//!   [`LibraryEvent`]s, and persist the updated snapshot.
//! - [`restore`](PlayerCore::restore) rehydrates all of the above from the
//!   state store on startup.
//!
//! Desktop apps typically enable the `desktop-shims` feature and call
//! [`desktop_dependencies`] with their sink; embedded hosts construct
//! [`CoreDependencies`] from their own bridge implementations.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use core_service::{desktop_dependencies, AudioSink, CoreConfig, PlayerCore};
//!
//! # async fn example(sink: Arc<dyn AudioSink>) -> core_service::Result<()> {
//! let config = CoreConfig::builder()
//!     .site_origin("https://music.example.com")
//!     .build()?;
//!
//! let core = PlayerCore::new(config, desktop_dependencies(sink)?)?;
//! core.restore().await?;
//! core.spawn_sink_event_pump();
//!
//! let page = core.search("evening rain").await?;
//! core.set_playlist(page.tracks).await;
//! core.play(0).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{CoreError, Result};

// The facade re-exports the vocabulary hosts need so they can depend on this
// crate alone.
pub use bridge_traits::{
    AudioSink, AudioWarmupCache, Clock, HttpTransport, SinkEvent, StateStore, SystemClock,
};
pub use core_catalog::ExploreOutcome;
pub use core_extract::SearchPage;
pub use core_library::{Playlist, Track, FAVORITES_ID};
pub use core_playback::RepeatMode;
pub use core_runtime::config::{
    CoreConfig, CoreConfigBuilder, ProxyEndpoint, ProxyResponseKind, SiteConfig,
};
pub use core_runtime::events::{
    EventBus, LibraryEvent, PlaybackEvent, PlayerEvent, Receiver,
};

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub use bridge_desktop::{HttpWarmupCache, JsonFileStateStore, ReqwestTransport};

use std::sync::Arc;

use core_catalog::{CatalogError, ExploreService, LyricsService, SearchService};
use core_fetch::ProxyFetcher;
use core_library::persistence::{Persistence, RecentsSnapshot, SessionSnapshot};
use core_library::{
    ExploreCache, LibraryError, LyricsCache, PlaylistStore, RecentsStore, SearchHistory,
};
use core_playback::{PlayerEngine, TrackResolver};
use core_runtime::events::DEFAULT_EVENT_BUFFER_SIZE;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

// =============================================================================
// Dependencies
// =============================================================================

/// Aggregated handle to all bridge implementations the core requires.
pub struct CoreDependencies {
    pub transport: Arc<dyn HttpTransport>,
    pub sink: Arc<dyn AudioSink>,
    pub warmup: Arc<dyn AudioWarmupCache>,
    pub store: Arc<dyn StateStore>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        sink: Arc<dyn AudioSink>,
        warmup: Arc<dyn AudioWarmupCache>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            sink,
            warmup,
            store,
            clock,
        }
    }
}

/// Build the stock desktop dependency bundle around a host-provided sink.
///
/// Uses the reqwest transport, the JSON-file state store in the platform data
/// directory, the detached HTTP warmup cache, and the system clock. There is
/// no default sink: audio output is owned by the host.
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub fn desktop_dependencies(sink: Arc<dyn AudioSink>) -> Result<CoreDependencies> {
    let store = JsonFileStateStore::open_default()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    Ok(CoreDependencies::new(
        Arc::new(ReqwestTransport::new()),
        sink,
        Arc::new(HttpWarmupCache::new()),
        Arc::new(store),
        Arc::new(SystemClock),
    ))
}

// =============================================================================
// PlayerCore
// =============================================================================

/// Primary facade exposed to host applications.
///
/// Cheap to clone; all clones share the same engine, stores, and caches.
/// State-changing calls persist their snapshot best-effort: a failed write is
/// logged and the call still succeeds, while [`persist`](PlayerCore::persist)
/// reports write failures to the caller.
#[derive(Clone)]
pub struct PlayerCore {
    deps: Arc<CoreDependencies>,
    config: CoreConfig,
    events: EventBus,
    search: Arc<SearchService>,
    explore: Arc<ExploreService>,
    lyrics: Arc<LyricsService>,
    engine: Arc<Mutex<PlayerEngine>>,
    playlists: Arc<Mutex<PlaylistStore>>,
    recents: Arc<Mutex<RecentsStore>>,
    history: Arc<Mutex<SearchHistory>>,
    explore_cache: Arc<Mutex<ExploreCache>>,
    lyrics_cache: Arc<Mutex<LyricsCache>>,
    persistence: Persistence,
}

impl PlayerCore {
    /// Wire the core from a validated config and a bridge bundle.
    pub fn new(config: CoreConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let deps = Arc::new(deps);
        let fetcher = Arc::new(ProxyFetcher::new(
            Arc::clone(&deps.transport),
            config.fetch.clone(),
        ));

        let history = Arc::new(Mutex::new(SearchHistory::new(config.cache.history_cap)));
        let explore_cache = Arc::new(Mutex::new(ExploreCache::new(config.cache.explore_ttl_ms)));
        let lyrics_cache = Arc::new(Mutex::new(LyricsCache::new()));

        let search = Arc::new(SearchService::new(
            Arc::clone(&fetcher),
            Arc::clone(&history),
            config.site.clone(),
            Arc::clone(&deps.clock),
        ));
        let explore = Arc::new(ExploreService::new(
            Arc::clone(&fetcher),
            Arc::clone(&explore_cache),
            config.site.clone(),
            Arc::clone(&deps.clock),
        ));
        let lyrics = Arc::new(LyricsService::new(
            Arc::clone(&fetcher),
            Arc::clone(&lyrics_cache),
        ));

        let events = EventBus::new(DEFAULT_EVENT_BUFFER_SIZE);
        let resolver = TrackResolver::new(Arc::clone(&fetcher), config.site.clone());
        let engine = PlayerEngine::new(
            Arc::clone(&deps.sink),
            Arc::clone(&deps.warmup),
            resolver,
            events.clone(),
        );

        info!(site = %config.site.origin, "Player core assembled");

        Ok(Self {
            persistence: Persistence::new(Arc::clone(&deps.store)),
            engine: Arc::new(Mutex::new(engine)),
            playlists: Arc::new(Mutex::new(PlaylistStore::new())),
            recents: Arc::new(Mutex::new(RecentsStore::new(config.cache.recents_cap))),
            history,
            explore_cache,
            lyrics_cache,
            search,
            explore,
            lyrics,
            events,
            config,
            deps,
        })
    }

    /// The configuration the core was built with.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Access the bridge dependencies being used by the core.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    /// Subscribe to playback and library events.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// The shared event bus, for hosts that filter or fan out themselves.
    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Rehydrate every store and cache from the state store.
    ///
    /// Missing snapshots leave the defaults in place, so a first run restores
    /// to a clean slate. Corrupt snapshots were already discarded by the
    /// persistence layer. The playback session is restored without autoplay;
    /// the next play/pause call starts the selected track.
    pub async fn restore(&self) -> Result<()> {
        if let Some(snapshot) = self.persistence.load_playlists().await? {
            *self.playlists.lock().await = PlaylistStore::from_snapshot(snapshot);
        }

        if let Some(snapshot) = self.persistence.load_recents().await? {
            *self.recents.lock().await = RecentsStore::from_parts(
                snapshot.recent_tracks,
                snapshot.recent_playlists,
                self.config.cache.recents_cap,
            );
            *self.history.lock().await =
                SearchHistory::from_snapshot(snapshot.search_history, self.config.cache.history_cap);
        }

        if let Some(snapshot) = self.persistence.load_lyrics().await? {
            *self.lyrics_cache.lock().await = LyricsCache::from_snapshot(snapshot);
        }

        if let Some(snapshot) = self.persistence.load_explore().await? {
            *self.explore_cache.lock().await =
                ExploreCache::from_snapshot(snapshot, self.config.cache.explore_ttl_ms);
        }

        if let Some(snapshot) = self.persistence.load_session().await? {
            self.engine.lock().await.restore(snapshot);
        }

        info!("Player state restored");
        Ok(())
    }

    /// Write every snapshot to the state store, reporting the first failure.
    pub async fn persist(&self) -> Result<()> {
        let session = self.engine.lock().await.session_snapshot();
        let playlists = self.playlists.lock().await.to_snapshot();
        let recents = self.recents_snapshot().await;
        let lyrics = self.lyrics_cache.lock().await.to_snapshot();
        let explore = self.explore_cache.lock().await.to_snapshot();

        self.persistence.save_session(&session).await?;
        self.persistence.save_playlists(&playlists).await?;
        self.persistence.save_recents(&recents).await?;
        self.persistence.save_lyrics(&lyrics).await?;
        self.persistence.save_explore(&explore).await?;
        Ok(())
    }

    /// Remove every persisted snapshot. In-memory state is untouched.
    pub async fn clear_saved_state(&self) -> Result<()> {
        self.persistence.clear_all().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Run a site search.
    ///
    /// The query lands in the persisted history even when the fetch fails,
    /// so it can be retried from the history list.
    pub async fn search(&self, query: &str) -> Result<SearchPage> {
        let result = self.search.search(query).await;
        if !matches!(result, Err(CatalogError::EmptyQuery)) {
            self.save_recents().await;
        }
        Ok(result?)
    }

    /// Recent search queries, most recent first.
    pub async fn recent_queries(&self) -> Vec<String> {
        self.search.recent_queries().await
    }

    /// Remove one remembered query. Returns whether it was present.
    pub async fn remove_recent_query(&self, query: &str) -> bool {
        let removed = self.search.remove_recent_query(query).await;
        if removed {
            self.save_recents().await;
        }
        removed
    }

    /// Forget the whole search history.
    pub async fn clear_recent_queries(&self) {
        self.search.clear_recent_queries().await;
        self.save_recents().await;
    }

    // ------------------------------------------------------------------
    // Explore
    // ------------------------------------------------------------------

    /// Load an explore listing, from cache when fresh. `force` refetches.
    pub async fn explore(&self, url: &str, force: bool) -> Result<ExploreOutcome> {
        let outcome = self.explore.explore(url, force).await?;
        if !outcome.from_cache {
            self.save_explore().await;
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Lyrics
    // ------------------------------------------------------------------

    /// Lyrics for a track, fetching its page on a cache miss.
    ///
    /// `Ok(None)` means the page holds no lyrics; that answer is cached until
    /// `force` re-checks it.
    pub async fn lyrics_for(&self, track: &Track, force: bool) -> Result<Option<String>> {
        let lyrics = self.lyrics.lyrics_for(track, force).await?;
        self.save_lyrics().await;
        Ok(lyrics)
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Replace the playback queue. Clears the selection and stops playback.
    pub async fn set_playlist(&self, tracks: Vec<Track>) {
        let mut engine = self.engine.lock().await;
        engine.set_playlist(tracks).await;
        let snapshot = engine.session_snapshot();
        drop(engine);

        self.save_session_snapshot(&snapshot).await;
    }

    /// The playback queue as last set or restored.
    pub async fn queue(&self) -> Vec<Track> {
        self.engine.lock().await.session().tracks().to_vec()
    }

    /// Select and start the track at `index` in the queue.
    pub async fn play(&self, index: usize) -> Result<()> {
        let mut engine = self.engine.lock().await;
        engine.play(index).await?;
        let started = engine.current_track().cloned();
        let snapshot = engine.session_snapshot();
        drop(engine);

        if let Some(track) = started {
            self.recents.lock().await.record_track(track);
            self.save_recents().await;
        }
        self.save_session_snapshot(&snapshot).await;
        Ok(())
    }

    /// Load a stored playlist into the queue and start its first track.
    pub async fn play_playlist(&self, id: i64) -> Result<()> {
        let Some(playlist) = self.playlist(id).await else {
            return Err(LibraryError::NotFound {
                entity_type: "playlist".to_string(),
                id,
            }
            .into());
        };

        self.recents.lock().await.record_playlist(id);
        self.save_recents().await;

        self.set_playlist(playlist.tracks).await;
        self.play(0).await
    }

    /// Pause when playing; start or resume the selection otherwise.
    pub async fn toggle_play_pause(&self) -> Result<()> {
        let mut engine = self.engine.lock().await;
        engine.toggle_play_pause().await?;
        let started = if engine.is_playing() {
            engine.current_track().cloned()
        } else {
            None
        };
        let snapshot = engine.session_snapshot();
        drop(engine);

        if let Some(track) = started {
            self.recents.lock().await.record_track(track);
            self.save_recents().await;
        }
        self.save_session_snapshot(&snapshot).await;
        Ok(())
    }

    /// Advance to the next track per the shuffle and repeat modes.
    pub async fn next(&self) -> Result<()> {
        let mut engine = self.engine.lock().await;
        engine.next().await?;
        let started = if engine.is_playing() {
            engine.current_track().cloned()
        } else {
            None
        };
        let snapshot = engine.session_snapshot();
        drop(engine);

        if let Some(track) = started {
            self.recents.lock().await.record_track(track);
            self.save_recents().await;
        }
        self.save_session_snapshot(&snapshot).await;
        Ok(())
    }

    /// Step back to the previous track, wrapping at the front.
    pub async fn previous(&self) -> Result<()> {
        let mut engine = self.engine.lock().await;
        engine.previous().await?;
        let started = if engine.is_playing() {
            engine.current_track().cloned()
        } else {
            None
        };
        let snapshot = engine.session_snapshot();
        drop(engine);

        if let Some(track) = started {
            self.recents.lock().await.record_track(track);
            self.save_recents().await;
        }
        self.save_session_snapshot(&snapshot).await;
        Ok(())
    }

    /// Seek to a position expressed as a fraction of the duration in `[0, 1]`.
    pub async fn seek(&self, fraction: f64) -> Result<()> {
        self.engine.lock().await.seek(fraction).await?;
        Ok(())
    }

    /// Toggle shuffle. Returns the new state.
    pub async fn toggle_shuffle(&self) -> bool {
        let mut engine = self.engine.lock().await;
        let enabled = engine.toggle_shuffle();
        let snapshot = engine.session_snapshot();
        drop(engine);

        self.save_session_snapshot(&snapshot).await;
        enabled
    }

    /// Cycle the repeat mode off -> one -> all. Returns the new mode.
    pub async fn toggle_repeat(&self) -> RepeatMode {
        let mut engine = self.engine.lock().await;
        let mode = engine.toggle_repeat();
        let snapshot = engine.session_snapshot();
        drop(engine);

        self.save_session_snapshot(&snapshot).await;
        mode
    }

    /// The selected track, if any.
    pub async fn current_track(&self) -> Option<Track> {
        self.engine.lock().await.current_track().cloned()
    }

    /// Whether the engine last told the sink to play.
    pub async fn is_playing(&self) -> bool {
        self.engine.lock().await.is_playing()
    }

    /// Feed one sink event through the engine.
    ///
    /// Track transitions (auto-advance, replay, fallback) update the recents
    /// and the persisted session; position reports do not touch the store.
    pub async fn handle_sink_event(&self, event: SinkEvent) {
        if matches!(event, SinkEvent::TimeUpdate { .. }) {
            self.engine.lock().await.handle_sink_event(event).await;
            return;
        }

        let mut engine = self.engine.lock().await;
        let before = engine.session().current_index();
        engine.handle_sink_event(event).await;
        let moved = engine.session().current_index() != before;
        let started = if moved && engine.is_playing() {
            engine.current_track().cloned()
        } else {
            None
        };
        let snapshot = engine.session_snapshot();
        drop(engine);

        if let Some(track) = started {
            self.recents.lock().await.record_track(track);
            self.save_recents().await;
        }
        self.save_session_snapshot(&snapshot).await;
    }

    /// Drive the engine from the sink's event stream on a background task.
    ///
    /// The task ends when the sink drops its event channel.
    pub fn spawn_sink_event_pump(&self) -> tokio::task::JoinHandle<()> {
        let core = self.clone();
        let mut events = core.deps.sink.subscribe_events();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => core.handle_sink_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Sink event pump fell behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // ------------------------------------------------------------------
    // Playlists and favorites
    // ------------------------------------------------------------------

    /// All playlists, favorites first.
    pub async fn playlists(&self) -> Vec<Playlist> {
        self.playlists.lock().await.all().cloned().collect()
    }

    /// One playlist by id.
    pub async fn playlist(&self, id: i64) -> Option<Playlist> {
        self.playlists.lock().await.get(id).cloned()
    }

    /// The favorites playlist.
    pub async fn favorites(&self) -> Playlist {
        self.playlists.lock().await.favorites().clone()
    }

    /// Create a named playlist and return its id.
    pub async fn create_playlist(&self, name: &str) -> Result<i64> {
        let mut store = self.playlists.lock().await;
        let id = store.create(name)?;
        let stored_name = store
            .get(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| name.to_string());
        drop(store);

        self.events
            .emit(PlayerEvent::Library(LibraryEvent::PlaylistCreated {
                playlist_id: id,
                name: stored_name,
            }))
            .ok();
        self.save_playlists().await;
        Ok(id)
    }

    /// Rename a playlist. The favorites playlist cannot be renamed.
    pub async fn rename_playlist(&self, id: i64, new_name: &str) -> Result<()> {
        self.playlists.lock().await.rename(id, new_name)?;

        self.events
            .emit(PlayerEvent::Library(LibraryEvent::PlaylistUpdated {
                playlist_id: id,
                change: "renamed".to_string(),
            }))
            .ok();
        self.save_playlists().await;
        Ok(())
    }

    /// Delete a playlist. The favorites playlist cannot be deleted.
    pub async fn delete_playlist(&self, id: i64) -> Result<()> {
        self.playlists.lock().await.delete(id)?;
        self.recents.lock().await.prune_playlist(id);

        self.events
            .emit(PlayerEvent::Library(LibraryEvent::PlaylistDeleted {
                playlist_id: id,
            }))
            .ok();
        self.save_playlists().await;
        self.save_recents().await;
        Ok(())
    }

    /// Append a track to a playlist, rejecting duplicates by track identity.
    pub async fn add_to_playlist(&self, id: i64, track: Track) -> Result<()> {
        self.playlists.lock().await.add_track(id, track)?;
        self.recents.lock().await.record_playlist(id);

        self.events
            .emit(PlayerEvent::Library(LibraryEvent::PlaylistUpdated {
                playlist_id: id,
                change: "track added".to_string(),
            }))
            .ok();
        self.save_playlists().await;
        self.save_recents().await;
        Ok(())
    }

    /// Remove a track from a playlist. Returns whether it was present.
    pub async fn remove_from_playlist(&self, id: i64, track: &Track) -> Result<bool> {
        let removed = self.playlists.lock().await.remove_track(id, track)?;
        if removed {
            self.events
                .emit(PlayerEvent::Library(LibraryEvent::PlaylistUpdated {
                    playlist_id: id,
                    change: "track removed".to_string(),
                }))
                .ok();
            self.save_playlists().await;
        }
        Ok(removed)
    }

    /// Record whether a playlist's audio has been fetched for offline use.
    pub async fn set_playlist_downloaded(&self, id: i64, downloaded: bool) -> Result<()> {
        self.playlists.lock().await.set_downloaded(id, downloaded)?;

        self.events
            .emit(PlayerEvent::Library(LibraryEvent::PlaylistUpdated {
                playlist_id: id,
                change: "download state".to_string(),
            }))
            .ok();
        self.save_playlists().await;
        Ok(())
    }

    /// Add or remove a track from favorites. Returns the new state.
    pub async fn toggle_favorite(&self, track: Track) -> Result<bool> {
        let title = track.title.clone();
        let favorited = self.playlists.lock().await.toggle_favorite(track)?;

        self.events
            .emit(PlayerEvent::Library(LibraryEvent::FavoriteToggled {
                title,
                favorited,
            }))
            .ok();
        self.save_playlists().await;
        Ok(favorited)
    }

    /// Whether this track is in favorites (by track identity).
    pub async fn is_favorite(&self, track: &Track) -> bool {
        self.playlists.lock().await.is_favorite(track)
    }

    /// Recently played tracks, most recent first.
    pub async fn recent_tracks(&self) -> Vec<Track> {
        self.recents.lock().await.recent_tracks().to_vec()
    }

    /// Recently used playlist ids, most recent first.
    pub async fn recent_playlists(&self) -> Vec<i64> {
        self.recents.lock().await.recent_playlists().to_vec()
    }

    // ------------------------------------------------------------------
    // Snapshot writers
    // ------------------------------------------------------------------

    async fn recents_snapshot(&self) -> RecentsSnapshot {
        let recents = self.recents.lock().await;
        let history = self.history.lock().await;
        RecentsSnapshot {
            recent_tracks: recents.recent_tracks().to_vec(),
            recent_playlists: recents.recent_playlists().to_vec(),
            search_history: history.to_snapshot(),
        }
    }

    async fn save_session_snapshot(&self, snapshot: &SessionSnapshot) {
        if let Err(err) = self.persistence.save_session(snapshot).await {
            warn!(error = %err, "Failed to persist the playback session");
        }
    }

    async fn save_playlists(&self) {
        let snapshot = self.playlists.lock().await.to_snapshot();
        if let Err(err) = self.persistence.save_playlists(&snapshot).await {
            warn!(error = %err, "Failed to persist playlists");
        }
    }

    async fn save_recents(&self) {
        let snapshot = self.recents_snapshot().await;
        if let Err(err) = self.persistence.save_recents(&snapshot).await {
            warn!(error = %err, "Failed to persist recents");
        }
    }

    async fn save_lyrics(&self) {
        let snapshot = self.lyrics_cache.lock().await.to_snapshot();
        if let Err(err) = self.persistence.save_lyrics(&snapshot).await {
            warn!(error = %err, "Failed to persist the lyrics cache");
        }
    }

    async fn save_explore(&self) {
        let snapshot = self.explore_cache.lock().await.to_snapshot();
        if let Err(err) = self.persistence.save_explore(&snapshot).await {
            warn!(error = %err, "Failed to persist the explore cache");
        }
    }
}

impl std::fmt::Debug for PlayerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCore")
            .field("site", &self.config.site.origin)
            .finish_non_exhaustive()
    }
}
