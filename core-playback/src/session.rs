//! # Playback Session State Machine
//!
//! Pure playlist-navigation state: the active track list, the current
//! position, and the shuffle/repeat modes. No I/O happens here; the
//! [`PlayerEngine`](crate::engine::PlayerEngine) asks the session where to go
//! next and then drives the audio sink accordingly.
//!
//! ## Design
//!
//! - `current` is `Option<usize>`: `None` means no track is selected. The
//!   persisted form uses `-1` for the same state (see [`SessionSnapshot`]).
//! - Shuffle is a full permutation of playlist indices, regenerated whenever
//!   shuffle is switched on and whenever a walk runs off either end of the
//!   permutation. Shuffled playback therefore never ends on its own.
//! - Wrapping from the last track back to the first on [`next`] is only a
//!   real wrap under [`RepeatMode::All`]; otherwise it is treated as
//!   end-of-list and the session reports [`SessionStep::Stopped`].
//!   [`previous`] always wraps.
//!
//! [`next`]: PlaybackSession::next
//! [`previous`]: PlaybackSession::previous

use core_library::models::Track;
use core_library::persistence::SessionSnapshot;
use rand::seq::SliceRandom;
use tracing::debug;

// ============================================================================
// Repeat Mode
// ============================================================================

/// What happens when playback reaches the end of a track or the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Play through the list once, stop at the end.
    #[default]
    Off,
    /// Replay the current track indefinitely.
    One,
    /// Wrap from the last track back to the first.
    All,
}

impl RepeatMode {
    /// The next mode in the `Off -> One -> All -> Off` cycle.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }

    /// Stable name used in persisted state.
    pub fn as_str(self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        }
    }

    /// Parse a persisted name; unknown values fall back to `Off`.
    pub fn from_persisted(value: &str) -> Self {
        match value {
            "one" => RepeatMode::One,
            "all" => RepeatMode::All,
            _ => RepeatMode::Off,
        }
    }
}

// ============================================================================
// Step Results
// ============================================================================

/// Outcome of a manual [`next`](PlaybackSession::next) or
/// [`previous`](PlaybackSession::previous) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// The session moved to this playlist index; the caller should play it.
    Moved(usize),
    /// End of list: nothing to advance to, the current selection is kept.
    Stopped,
}

/// Outcome of a track finishing on its own
/// ([`on_track_end`](PlaybackSession::on_track_end)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAction {
    /// Replay the current track from the start (repeat-one).
    Replay,
    /// Advance to this playlist index.
    Moved(usize),
    /// End of list: playback stops.
    Stopped,
}

// ============================================================================
// Playback Session
// ============================================================================

/// The active playlist plus navigation state.
///
/// All methods are synchronous and cheap; the owning engine serializes
/// access, so there is no interior locking.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    tracks: Vec<Track>,
    current: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    /// Permutation of `0..tracks.len()`, only meaningful while `shuffle` is on.
    shuffle_order: Vec<usize>,
}

impl PlaybackSession {
    /// Create an empty session: no tracks, nothing selected, shuffle and
    /// repeat off.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Tracks in playlist order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Index of the selected track, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The selected track, if any.
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Number of tracks in the playlist.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the playlist is empty.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether shuffle is on.
    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    /// The active repeat mode.
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    // ------------------------------------------------------------------
    // Playlist and selection
    // ------------------------------------------------------------------

    /// Replace the playlist. Clears the selection; shuffle and repeat modes
    /// survive the swap, with a fresh shuffle order for the new list.
    pub fn set_playlist(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.current = None;
        if self.shuffle {
            self.regenerate_shuffle_order();
        }
        debug!(tracks = self.tracks.len(), "Playlist replaced");
    }

    /// Select the track at `index`. Returns `false` (and changes nothing)
    /// when the index is out of bounds.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        self.current = Some(index);
        true
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Advance to the next track.
    ///
    /// Sequentially this is `current + 1`; wrapping past the last track only
    /// happens under [`RepeatMode::All`], otherwise the step reports
    /// [`SessionStep::Stopped`] and the selection stays put. With shuffle on,
    /// this walks the shuffle order and regenerates it when the walk runs off
    /// the end, so a shuffled playlist never stops by itself.
    pub fn next(&mut self) -> SessionStep {
        if self.tracks.is_empty() {
            return SessionStep::Stopped;
        }
        if self.shuffle {
            return self.step_shuffled_forward();
        }

        let step = match self.current {
            None => SessionStep::Moved(0),
            Some(cur) if cur + 1 < self.tracks.len() => SessionStep::Moved(cur + 1),
            Some(_) if self.repeat == RepeatMode::All => SessionStep::Moved(0),
            Some(_) => SessionStep::Stopped,
        };
        if let SessionStep::Moved(index) = step {
            self.current = Some(index);
        }
        step
    }

    /// Step back to the previous track.
    ///
    /// Unlike [`next`](Self::next), stepping back from the first track always
    /// wraps to the last, regardless of repeat mode. With shuffle on, this
    /// walks the shuffle order backward and regenerates it when the walk runs
    /// off the front.
    pub fn previous(&mut self) -> SessionStep {
        if self.tracks.is_empty() {
            return SessionStep::Stopped;
        }
        if self.shuffle {
            return self.step_shuffled_backward();
        }

        let last = self.tracks.len() - 1;
        let index = match self.current {
            None | Some(0) => last,
            Some(cur) => cur - 1,
        };
        self.current = Some(index);
        SessionStep::Moved(index)
    }

    /// React to the current track finishing on its own.
    ///
    /// Under [`RepeatMode::One`] the same track replays; otherwise this is
    /// a [`next`](Self::next) step.
    pub fn on_track_end(&mut self) -> EndAction {
        if self.current.is_none() {
            return EndAction::Stopped;
        }
        if self.repeat == RepeatMode::One {
            return EndAction::Replay;
        }
        match self.next() {
            SessionStep::Moved(index) => EndAction::Moved(index),
            SessionStep::Stopped => EndAction::Stopped,
        }
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    /// Flip shuffle. Switching it on draws a fresh shuffle order; the
    /// selection is unaffected either way. Returns the new state.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        if self.shuffle {
            self.regenerate_shuffle_order();
        } else {
            self.shuffle_order.clear();
        }
        debug!(shuffle = self.shuffle, "Shuffle toggled");
        self.shuffle
    }

    /// Cycle the repeat mode (`Off -> One -> All -> Off`) and return the new
    /// mode.
    pub fn toggle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycled();
        debug!(repeat = self.repeat.as_str(), "Repeat toggled");
        self.repeat
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Snapshot for the state store (`-1` encodes "nothing selected").
    pub fn to_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tracks: self.tracks.clone(),
            current_index: self.current.map(|i| i as i64).unwrap_or(-1),
            shuffle: self.shuffle,
            repeat: self.repeat.as_str().to_string(),
        }
    }

    /// Rebuild a session from a snapshot.
    ///
    /// Out-of-range indices and unknown repeat names degrade to "nothing
    /// selected" and `Off` rather than failing; the shuffle order is drawn
    /// fresh (it is never persisted).
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        let len = snapshot.tracks.len() as i64;
        let current = if (0..len).contains(&snapshot.current_index) {
            Some(snapshot.current_index as usize)
        } else {
            None
        };
        let mut session = Self {
            tracks: snapshot.tracks,
            current,
            shuffle: snapshot.shuffle,
            repeat: RepeatMode::from_persisted(&snapshot.repeat),
            shuffle_order: Vec::new(),
        };
        if session.shuffle {
            session.regenerate_shuffle_order();
        }
        session
    }

    // ------------------------------------------------------------------
    // Shuffle internals
    // ------------------------------------------------------------------

    fn step_shuffled_forward(&mut self) -> SessionStep {
        let index = match self.shuffle_position() {
            Some(pos) if pos + 1 < self.shuffle_order.len() => self.shuffle_order[pos + 1],
            Some(_) => {
                // Walked off the end: reshuffle and start over from the head.
                self.regenerate_shuffle_order();
                self.shuffle_order[0]
            }
            None => self.shuffle_order[0],
        };
        self.current = Some(index);
        SessionStep::Moved(index)
    }

    fn step_shuffled_backward(&mut self) -> SessionStep {
        let last = self.shuffle_order.len() - 1;
        let index = match self.shuffle_position() {
            Some(pos) if pos > 0 => self.shuffle_order[pos - 1],
            Some(_) => {
                // Walked off the front: reshuffle and re-enter at the tail.
                self.regenerate_shuffle_order();
                self.shuffle_order[last]
            }
            None => self.shuffle_order[last],
        };
        self.current = Some(index);
        SessionStep::Moved(index)
    }

    /// Position of the current track within the shuffle order.
    fn shuffle_position(&self) -> Option<usize> {
        let cur = self.current?;
        self.shuffle_order.iter().position(|&i| i == cur)
    }

    /// Draw a fresh uniform permutation of `0..tracks.len()`.
    fn regenerate_shuffle_order(&mut self) {
        let mut order: Vec<usize> = (0..self.tracks.len()).collect();
        order.shuffle(&mut rand::thread_rng());
        self.shuffle_order = order;
    }
}

// ============================================================================
// Tests
// ============================================================================
