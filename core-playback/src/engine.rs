//! # Player Engine
//!
//! Drives the platform audio sink from the [`PlaybackSession`] state machine.
//! The engine owns the session, resolves tracks to playable URLs through the
//! [`TrackResolver`], and publishes [`PlaybackEvent`]s on the shared bus.
//!
//! ## Overview
//!
//! The engine is deliberately single-threaded: the host calls its methods
//! sequentially (user actions plus a pump that forwards [`SinkEvent`]s from
//! the platform sink into [`handle_sink_event`]). There is no interior
//! locking; the owner serializes access.
//!
//! ## Failure reporting
//!
//! Failures travel on two channels depending on who is there to hear them:
//!
//! - Direct API calls (`play`, `next`, `seek`, ...) return `Result`; the
//!   caller decides what to do.
//! - Sink-event handling has no caller to answer to, so
//!   [`handle_sink_event`] is infallible and converts failures into
//!   [`PlaybackEvent::TrackFailed`] / [`PlaybackEvent::Stopped`] events.
//!
//! ## Direct-URL fallback
//!
//! Tracks whose `url` already looks like audio are loaded as-is. When such a
//! load is refused by the sink (synchronously, or later through a
//! [`SinkEvent::Error`]), the engine retries exactly once by resolving the
//! track's `page_url` through the extraction cascade. Page-resolved sources
//! get no second chance; their errors surface immediately.
//!
//! [`handle_sink_event`]: PlayerEngine::handle_sink_event

use std::sync::Arc;

use bridge_traits::cache::AudioWarmupCache;
use bridge_traits::error::BridgeError;
use bridge_traits::sink::{AudioSink, SinkEvent};
use core_library::models::Track;
use core_library::persistence::SessionSnapshot;
use core_runtime::events::{EventBus, PlaybackEvent, PlayerEvent};
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};
use crate::resolver::TrackResolver;
use crate::session::{EndAction, PlaybackSession, RepeatMode, SessionStep};

/// Playlist-aware playback driver on top of a platform [`AudioSink`].
pub struct PlayerEngine {
    session: PlaybackSession,
    sink: Arc<dyn AudioSink>,
    warmup: Arc<dyn AudioWarmupCache>,
    resolver: TrackResolver,
    events: EventBus,
    /// Whether the sink is currently told to play (vs paused/stopped).
    playing: bool,
    /// Whether the sink holds a loaded source for the current selection.
    loaded: bool,
    /// The loaded source came from the track's direct `url`; the page
    /// fallback is still available if the sink reports an error.
    direct_source: bool,
    /// The one-shot page fallback was already spent on the current track.
    fallback_used: bool,
}

impl PlayerEngine {
    pub fn new(
        sink: Arc<dyn AudioSink>,
        warmup: Arc<dyn AudioWarmupCache>,
        resolver: TrackResolver,
        events: EventBus,
    ) -> Self {
        Self {
            session: PlaybackSession::new(),
            sink,
            warmup,
            resolver,
            events,
            playing: false,
            loaded: false,
            direct_source: false,
            fallback_used: false,
        }
    }

    // ------------------------------------------------------------------
    // State access
    // ------------------------------------------------------------------

    /// The underlying session (playlist, selection, modes).
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// The selected track, if any.
    pub fn current_track(&self) -> Option<&Track> {
        self.session.current_track()
    }

    /// Whether the engine last told the sink to play.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    // ------------------------------------------------------------------
    // Playlist control
    // ------------------------------------------------------------------

    /// Replace the active playlist. Clears the selection and stops playback;
    /// nothing starts until the caller picks a track.
    pub async fn set_playlist(&mut self, tracks: Vec<Track>) {
        let was_playing = self.playing;
        self.session.set_playlist(tracks);
        self.loaded = false;
        self.direct_source = false;
        self.fallback_used = false;
        if was_playing {
            self.pause_sink("replacing playlist").await;
            self.events
                .emit(PlayerEvent::Playback(PlaybackEvent::Stopped))
                .ok();
        }
    }

    /// Start playing the track at `index` in the active playlist.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::NothingToPlay`] for an out-of-range index; resolution
    /// and sink failures pass through (after the one-shot page fallback for
    /// direct URLs has been tried).
    pub async fn play(&mut self, index: usize) -> Result<()> {
        if !self.session.select(index) {
            return Err(PlaybackError::NothingToPlay);
        }
        self.start_current().await
    }

    /// Pause when playing; resume (or start the first track) when paused.
    pub async fn toggle_play_pause(&mut self) -> Result<()> {
        let Some(index) = self.session.current_index() else {
            // Nothing selected yet: default to the head of the playlist.
            if self.session.is_empty() {
                return Err(PlaybackError::NothingToPlay);
            }
            return self.play(0).await;
        };

        if self.playing {
            self.sink.pause().await?;
            self.playing = false;
            self.events
                .emit(PlayerEvent::Playback(PlaybackEvent::TrackPaused { index }))
                .ok();
            Ok(())
        } else if !self.loaded {
            // Selection restored from a snapshot; the sink has no source yet.
            self.start_current().await
        } else {
            self.sink.play().await?;
            self.playing = true;
            self.events
                .emit(PlayerEvent::Playback(PlaybackEvent::TrackResumed { index }))
                .ok();
            Ok(())
        }
    }

    /// Advance to the next track. At the end of the list (without repeat-all
    /// and without shuffle) playback stops instead of wrapping.
    pub async fn next(&mut self) -> Result<()> {
        match self.session.next() {
            SessionStep::Moved(_) => self.start_current().await,
            SessionStep::Stopped => {
                self.enter_stopped("end of playlist").await;
                Ok(())
            }
        }
    }

    /// Step back to the previous track (wraps from the first to the last).
    pub async fn previous(&mut self) -> Result<()> {
        match self.session.previous() {
            SessionStep::Moved(_) => self.start_current().await,
            SessionStep::Stopped => {
                self.enter_stopped("empty playlist").await;
                Ok(())
            }
        }
    }

    /// Seek to a fraction of the track, `0.0..=1.0`. Out-of-range values are
    /// clamped; when the sink does not know the duration yet the seek is
    /// dropped.
    pub async fn seek(&mut self, fraction: f64) -> Result<()> {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self.sink.duration().await? {
            Some(duration) if duration > 0.0 => {
                self.sink.seek_to(fraction * duration).await?;
            }
            _ => debug!(fraction, "Seek dropped, duration unknown"),
        }
        Ok(())
    }

    /// Flip shuffle; returns the new state.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.session.toggle_shuffle()
    }

    /// Cycle the repeat mode; returns the new mode.
    pub fn toggle_repeat(&mut self) -> RepeatMode {
        self.session.toggle_repeat()
    }

    // ------------------------------------------------------------------
    // Sink events
    // ------------------------------------------------------------------

    /// Feed one event from the platform sink into the engine.
    ///
    /// Infallible: resolution and sink failures inside the handler become
    /// [`PlaybackEvent::TrackFailed`] / [`PlaybackEvent::Stopped`] bus events
    /// (see the module docs).
    pub async fn handle_sink_event(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::Ended => self.handle_track_ended().await,
            SinkEvent::Error { message } => self.handle_sink_error(message).await,
            // Position updates flow straight from the sink to the UI; the
            // engine keeps no position state.
            SinkEvent::TimeUpdate { .. } => {}
        }
    }

    async fn handle_track_ended(&mut self) {
        match self.session.on_track_end() {
            EndAction::Replay => {
                let replayed = self.replay_current().await;
                if let Err(err) = replayed {
                    self.fail_current(err.to_string());
                }
            }
            EndAction::Moved(_) => {
                if let Err(err) = self.start_current().await {
                    self.fail_current(err.to_string());
                }
            }
            EndAction::Stopped => self.enter_stopped("end of playlist").await,
        }
    }

    async fn handle_sink_error(&mut self, message: String) {
        let (Some(index), Some(track)) = (
            self.session.current_index(),
            self.session.current_track().cloned(),
        ) else {
            warn!(message, "Sink error with no current track");
            return;
        };

        if self.direct_source && !self.fallback_used {
            info!(
                index,
                title = %track.title,
                message,
                "Direct source failed, retrying through page"
            );
            if let Err(err) = self.start_via_fallback_page(index, &track).await {
                self.fail_track(index, &track, err.to_string());
            }
        } else {
            self.fail_track(index, &track, message);
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Snapshot of the session for the state store.
    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.session.to_snapshot()
    }

    /// Restore playlist, selection and modes from a snapshot. Never starts
    /// playback; the first `toggle_play_pause` or `play` loads the source.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.session = PlaybackSession::from_snapshot(snapshot);
        self.playing = false;
        self.loaded = false;
        self.direct_source = false;
        self.fallback_used = false;
        debug!(
            tracks = self.session.len(),
            current = ?self.session.current_index(),
            "Session restored"
        );
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Resolve and start the session's current track.
    async fn start_current(&mut self) -> Result<()> {
        let (index, track) = match (
            self.session.current_index(),
            self.session.current_track().cloned(),
        ) {
            (Some(index), Some(track)) => (index, track),
            _ => return Err(PlaybackError::NothingToPlay),
        };
        self.loaded = false;
        self.direct_source = false;
        self.fallback_used = false;

        if self.resolver.is_direct(&track) {
            match self.start_source(&track.url).await {
                Ok(()) => {
                    self.direct_source = true;
                    self.announce_started(index, &track);
                    return Ok(());
                }
                Err(err) => {
                    // The sink refused the direct URL up front (the usual
                    // shape of a cross-origin rejection). Same fallback as
                    // for an asynchronous sink error.
                    info!(
                        index,
                        title = %track.title,
                        error = %err,
                        "Direct source refused, resolving through page"
                    );
                }
            }
            self.start_via_fallback_page(index, &track).await
        } else {
            let url = self.resolver.resolve_from_page(&track).await?;
            self.start_source(&url).await?;
            self.announce_started(index, &track);
            Ok(())
        }
    }

    /// One-shot retry through `page_url` after a failed direct attempt.
    async fn start_via_fallback_page(&mut self, index: usize, track: &Track) -> Result<()> {
        self.fallback_used = true;
        let url = self.resolver.resolve_from_fallback_page(track).await?;
        self.start_source(&url).await?;
        self.direct_source = false;
        self.announce_started(index, track);
        Ok(())
    }

    /// Load `url` into the sink, start it, and warm the platform byte cache.
    async fn start_source(&mut self, url: &str) -> std::result::Result<(), BridgeError> {
        self.sink.load(url).await?;
        self.sink.play().await?;
        self.loaded = true;
        self.playing = true;
        self.warmup.precache(url).await;
        Ok(())
    }

    /// Rewind the current source and play it again (repeat-one).
    async fn replay_current(&mut self) -> std::result::Result<(), BridgeError> {
        self.sink.seek_to(0.0).await?;
        self.sink.play().await?;
        self.playing = true;
        if let (Some(index), Some(track)) = (
            self.session.current_index(),
            self.session.current_track().cloned(),
        ) {
            self.announce_started(index, &track);
        }
        Ok(())
    }

    fn announce_started(&mut self, index: usize, track: &Track) {
        info!(index, title = %track.title, "Track started");
        self.events
            .emit(PlayerEvent::Playback(PlaybackEvent::TrackStarted {
                index,
                title: track.title.clone(),
            }))
            .ok();
    }

    async fn enter_stopped(&mut self, reason: &str) {
        debug!(reason, "Playback stopped");
        self.pause_sink(reason).await;
        self.events
            .emit(PlayerEvent::Playback(PlaybackEvent::Stopped))
            .ok();
    }

    /// Best-effort sink pause; a refusal is logged, not propagated.
    async fn pause_sink(&mut self, context: &str) {
        if let Err(err) = self.sink.pause().await {
            warn!(context, error = %err, "Sink pause failed");
        }
        self.playing = false;
    }

    fn fail_current(&mut self, message: String) {
        match (
            self.session.current_index(),
            self.session.current_track().cloned(),
        ) {
            (Some(index), Some(track)) => self.fail_track(index, &track, message),
            _ => {
                warn!(message, "Playback failed with no current track");
                self.playing = false;
                self.events
                    .emit(PlayerEvent::Playback(PlaybackEvent::TrackFailed {
                        index: None,
                        title: String::new(),
                        message,
                    }))
                    .ok();
            }
        }
    }

    fn fail_track(&mut self, index: usize, track: &Track, message: String) {
        warn!(index, title = %track.title, message, "Track failed");
        self.playing = false;
        self.loaded = false;
        self.events
            .emit(PlayerEvent::Playback(PlaybackEvent::TrackFailed {
                index: Some(index),
                title: track.title.clone(),
                message,
            }))
            .ok();
    }
}

impl std::fmt::Debug for PlayerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerEngine")
            .field("tracks", &self.session.len())
            .field("current", &self.session.current_index())
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::cache::NoopWarmupCache;
    use bridge_traits::http::HttpTransport;
    use core_fetch::ProxyFetcher;
    use core_runtime::config::{FetchConfig, ProxyEndpoint, ProxyResponseKind, SiteConfig};
    use core_runtime::events::Receiver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::broadcast;

    const SONG_PAGE: &str = r#"
        <html><body>
          <audio><source src="/files/rain-falls.mp3" type="audio/mpeg"></audio>
        </body></html>
    "#;

    const RESOLVED: &str = "https://music.example.com/files/rain-falls.mp3";

    // ------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------

    /// Records every sink call; loads matching a refused fragment error out.
    struct FakeSink {
        calls: StdMutex<Vec<String>>,
        refused: StdMutex<Vec<String>>,
        duration: StdMutex<Option<f64>>,
        events: broadcast::Sender<SinkEvent>,
    }

    impl FakeSink {
        fn new() -> Arc<Self> {
            let (events, _) = broadcast::channel(8);
            Arc::new(Self {
                calls: StdMutex::new(Vec::new()),
                refused: StdMutex::new(Vec::new()),
                duration: StdMutex::new(None),
                events,
            })
        }

        fn refuse(&self, fragment: &str) {
            self.refused.lock().unwrap().push(fragment.to_string());
        }

        fn set_duration(&self, duration: Option<f64>) {
            *self.duration.lock().unwrap() = duration;
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl AudioSink for FakeSink {
        async fn load(&self, url: &str) -> bridge_traits::error::Result<()> {
            self.calls.lock().unwrap().push(format!("load:{url}"));
            let refused = self.refused.lock().unwrap();
            if refused.iter().any(|f| url.contains(f.as_str())) {
                return Err(BridgeError::OperationFailed(
                    "cross-origin request blocked".into(),
                ));
            }
            Ok(())
        }

        async fn play(&self) -> bridge_traits::error::Result<()> {
            self.calls.lock().unwrap().push("play".into());
            Ok(())
        }

        async fn pause(&self) -> bridge_traits::error::Result<()> {
            self.calls.lock().unwrap().push("pause".into());
            Ok(())
        }

        async fn seek_to(&self, position_secs: f64) -> bridge_traits::error::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("seek:{position_secs}"));
            Ok(())
        }

        async fn current_time(&self) -> bridge_traits::error::Result<f64> {
            Ok(0.0)
        }

        async fn duration(&self) -> bridge_traits::error::Result<Option<f64>> {
            Ok(*self.duration.lock().unwrap())
        }

        fn subscribe_events(&self) -> broadcast::Receiver<SinkEvent> {
            self.events.subscribe()
        }
    }

    struct FakeTransport {
        calls: AtomicUsize,
        body: &'static str,
    }

    #[async_trait::async_trait]
    impl HttpTransport for FakeTransport {
        async fn get_text(&self, _url: &str) -> bridge_traits::error::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.to_string())
        }
    }

    mockall::mock! {
        WarmupCache {}

        #[async_trait::async_trait]
        impl AudioWarmupCache for WarmupCache {
            async fn precache(&self, url: &str);
        }
    }

    // ------------------------------------------------------------------
    // Harness
    // ------------------------------------------------------------------

    struct Harness {
        engine: PlayerEngine,
        sink: Arc<FakeSink>,
        transport: Arc<FakeTransport>,
        rx: Receiver<PlayerEvent>,
    }

    fn site() -> SiteConfig {
        SiteConfig {
            origin: "https://music.example.com".to_string(),
            search_path: "/search".to_string(),
            download_host_fragment: "download".to_string(),
        }
    }

    fn resolver(transport: Arc<FakeTransport>) -> TrackResolver {
        let config = FetchConfig {
            proxies: vec![ProxyEndpoint::new(
                "raw",
                "https://raw.test/{url}",
                ProxyResponseKind::Raw,
            )],
            attempt_timeout_ms: 3000,
            max_retries: 0,
            retry_backoff_ms: 500,
        };
        TrackResolver::new(Arc::new(ProxyFetcher::new(transport, config)), site())
    }

    fn harness() -> Harness {
        harness_with_warmup(Arc::new(NoopWarmupCache))
    }

    fn harness_with_warmup(warmup: Arc<dyn AudioWarmupCache>) -> Harness {
        let sink = FakeSink::new();
        let transport = Arc::new(FakeTransport {
            calls: AtomicUsize::new(0),
            body: SONG_PAGE,
        });
        let bus = EventBus::new(16);
        let rx = bus.subscribe();
        let engine = PlayerEngine::new(sink.clone(), warmup, resolver(transport.clone()), bus);
        Harness {
            engine,
            sink,
            transport,
            rx,
        }
    }

    fn drain(rx: &mut Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn direct_track() -> Track {
        Track::new(1, "Rain Falls", "Artist", "https://cdn.example.net/rain.mp3")
            .with_page_url("https://music.example.com/song/rain-falls")
    }

    fn page_track() -> Track {
        Track::new(2, "Blue Sky", "", "https://music.example.com/song/blue-sky")
    }

    fn started_events(events: &[PlayerEvent]) -> Vec<(usize, String)> {
        events
            .iter()
            .filter_map(|event| match event {
                PlayerEvent::Playback(PlaybackEvent::TrackStarted { index, title }) => {
                    Some((*index, title.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn failed_events(events: &[PlayerEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                PlayerEvent::Playback(PlaybackEvent::TrackFailed { message, .. }) => {
                    Some(message.clone())
                }
                _ => None,
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn direct_track_plays_without_touching_the_network() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();

        assert_eq!(
            h.sink.calls(),
            vec!["load:https://cdn.example.net/rain.mp3".to_string(), "play".to_string()]
        );
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 0);
        assert!(h.engine.is_playing());
        assert_eq!(
            started_events(&drain(&mut h.rx)),
            vec![(0, "Rain Falls".to_string())]
        );
    }

    #[tokio::test]
    async fn page_track_resolves_through_extraction() {
        let mut h = harness();
        h.engine.set_playlist(vec![page_track()]).await;
        h.engine.play(0).await.unwrap();

        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.sink.calls(),
            vec![format!("load:{RESOLVED}"), "play".to_string()]
        );
    }

    #[tokio::test]
    async fn refused_direct_load_falls_back_to_the_page() {
        let mut h = harness();
        h.sink.refuse("cdn.example.net");
        h.engine.set_playlist(vec![direct_track()]).await;

        // The caller never sees the direct failure.
        h.engine.play(0).await.unwrap();

        let calls = h.sink.calls();
        assert_eq!(
            calls,
            vec![
                "load:https://cdn.example.net/rain.mp3".to_string(),
                format!("load:{RESOLVED}"),
                "play".to_string(),
            ]
        );
        let events = drain(&mut h.rx);
        assert_eq!(started_events(&events).len(), 1);
        assert!(failed_events(&events).is_empty());
    }

    #[tokio::test]
    async fn sink_error_event_triggers_the_page_fallback() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();

        h.engine
            .handle_sink_event(SinkEvent::Error {
                message: "MEDIA_ERR_SRC_NOT_SUPPORTED".into(),
            })
            .await;

        let calls = h.sink.calls();
        assert!(calls.contains(&format!("load:{RESOLVED}")));
        let events = drain(&mut h.rx);
        assert!(failed_events(&events).is_empty());
        assert_eq!(started_events(&events).len(), 2);
        assert!(h.engine.is_playing());
    }

    #[tokio::test]
    async fn error_without_a_fallback_page_fails_the_track() {
        let mut h = harness();
        let orphan = Track::new(3, "Orphan", "", "https://cdn.example.net/orphan.mp3");
        h.engine.set_playlist(vec![orphan]).await;
        h.engine.play(0).await.unwrap();

        h.engine
            .handle_sink_event(SinkEvent::Error {
                message: "network down".into(),
            })
            .await;

        let events = drain(&mut h.rx);
        let failures = failed_events(&events);
        assert_eq!(failures.len(), 1);
        assert!(!h.engine.is_playing());
        // Only the original load reached the sink.
        assert_eq!(
            h.sink.calls(),
            vec![
                "load:https://cdn.example.net/orphan.mp3".to_string(),
                "play".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn page_resolved_source_gets_no_second_fallback() {
        let mut h = harness();
        h.engine.set_playlist(vec![page_track()]).await;
        h.engine.play(0).await.unwrap();
        let fetches_before = h.transport.calls.load(Ordering::SeqCst);

        h.engine
            .handle_sink_event(SinkEvent::Error {
                message: "decode error".into(),
            })
            .await;

        assert_eq!(h.transport.calls.load(Ordering::SeqCst), fetches_before);
        assert_eq!(failed_events(&drain(&mut h.rx)).len(), 1);
    }

    #[tokio::test]
    async fn ended_advances_to_the_next_track() {
        let mut h = harness();
        let second = Track::new(4, "Second", "", "https://cdn.example.net/second.mp3");
        h.engine.set_playlist(vec![direct_track(), second]).await;
        h.engine.play(0).await.unwrap();

        h.engine.handle_sink_event(SinkEvent::Ended).await;

        assert_eq!(h.engine.session().current_index(), Some(1));
        assert!(h
            .sink
            .calls()
            .contains(&"load:https://cdn.example.net/second.mp3".to_string()));
    }

    #[tokio::test]
    async fn ended_with_repeat_one_replays_in_place() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();
        h.engine.toggle_repeat(); // One

        h.engine.handle_sink_event(SinkEvent::Ended).await;

        assert_eq!(h.engine.session().current_index(), Some(0));
        let calls = h.sink.calls();
        assert!(calls.contains(&"seek:0".to_string()));
        // One load only; the replay reuses the loaded source.
        assert_eq!(calls.iter().filter(|c| c.starts_with("load:")).count(), 1);
    }

    #[tokio::test]
    async fn ended_at_the_last_track_with_repeat_off_stops() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();

        h.engine.handle_sink_event(SinkEvent::Ended).await;

        assert!(!h.engine.is_playing());
        assert_eq!(h.engine.session().current_index(), Some(0));
        let events = drain(&mut h.rx);
        assert!(events.contains(&PlayerEvent::Playback(PlaybackEvent::Stopped)));
    }

    #[tokio::test]
    async fn manual_next_at_the_end_stops_without_wrapping() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();

        h.engine.next().await.unwrap();

        assert!(!h.engine.is_playing());
        assert!(h.sink.calls().contains(&"pause".to_string()));
        let events = drain(&mut h.rx);
        assert!(events.contains(&PlayerEvent::Playback(PlaybackEvent::Stopped)));
    }

    #[tokio::test]
    async fn toggle_play_pause_round_trips() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();

        h.engine.toggle_play_pause().await.unwrap();
        assert!(!h.engine.is_playing());
        h.engine.toggle_play_pause().await.unwrap();
        assert!(h.engine.is_playing());

        let events = drain(&mut h.rx);
        assert!(events.contains(&PlayerEvent::Playback(PlaybackEvent::TrackPaused { index: 0 })));
        assert!(events.contains(&PlayerEvent::Playback(PlaybackEvent::TrackResumed { index: 0 })));
    }

    #[tokio::test]
    async fn toggle_play_pause_with_no_selection_starts_the_first_track() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track(), page_track()]).await;

        h.engine.toggle_play_pause().await.unwrap();

        assert_eq!(h.engine.session().current_index(), Some(0));
        assert!(h.engine.is_playing());
    }

    #[tokio::test]
    async fn toggle_play_pause_on_an_empty_playlist_is_an_error() {
        let mut h = harness();
        let err = h.engine.toggle_play_pause().await.unwrap_err();
        assert!(matches!(err, PlaybackError::NothingToPlay));
    }

    #[tokio::test]
    async fn seek_scales_by_duration_and_clamps() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();
        h.sink.set_duration(Some(200.0));

        h.engine.seek(0.25).await.unwrap();
        h.engine.seek(2.0).await.unwrap();
        h.engine.seek(-1.0).await.unwrap();

        let seeks: Vec<String> = h
            .sink
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("seek:"))
            .collect();
        assert_eq!(seeks, vec!["seek:50", "seek:200", "seek:0"]);
    }

    #[tokio::test]
    async fn seek_is_dropped_while_duration_is_unknown() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();

        h.engine.seek(0.5).await.unwrap();

        assert!(!h.sink.calls().iter().any(|c| c.starts_with("seek:")));
    }

    #[tokio::test]
    async fn started_sources_are_offered_to_the_warmup_cache() {
        let mut warmup = MockWarmupCache::new();
        warmup
            .expect_precache()
            .withf(|url| url.ends_with("rain.mp3"))
            .times(1)
            .returning(|_| ());

        let mut h = harness_with_warmup(Arc::new(warmup));
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();
    }

    #[tokio::test]
    async fn restore_keeps_the_selection_without_autoplay() {
        let mut h = harness();
        let snapshot = SessionSnapshot {
            tracks: vec![direct_track(), page_track()],
            current_index: 1,
            shuffle: false,
            repeat: "all".to_string(),
        };

        h.engine.restore(snapshot);

        assert_eq!(h.engine.session().current_index(), Some(1));
        assert_eq!(h.engine.session().repeat_mode(), RepeatMode::All);
        assert!(!h.engine.is_playing());
        assert!(h.sink.calls().is_empty());

        // First toggle after a restore loads the selected track.
        h.engine.toggle_play_pause().await.unwrap();
        assert!(h.engine.is_playing());
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn replacing_the_playlist_stops_playback() {
        let mut h = harness();
        h.engine.set_playlist(vec![direct_track()]).await;
        h.engine.play(0).await.unwrap();

        h.engine.set_playlist(vec![page_track()]).await;

        assert!(!h.engine.is_playing());
        assert_eq!(h.engine.session().current_index(), None);
        let events = drain(&mut h.rx);
        assert!(events.contains(&PlayerEvent::Playback(PlaybackEvent::Stopped)));
    }
}
