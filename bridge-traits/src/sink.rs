//! Audio Sink Abstraction
//!
//! [`AudioSink`] is the single boundary between the playback engine and the
//! platform's media primitive (an HTML `<audio>` element, a native player, or
//! a test double). The engine assumes nothing about the sink beyond this
//! contract: load/play/pause/seek, position and duration queries, and the
//! `ended`/`error`/`timeupdate` event stream.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;

/// Events fired by the sink while a source is loaded.
///
/// Delivered on a broadcast channel so the engine and any observers (UI
/// progress bars) can subscribe independently.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// The current source played to completion.
    Ended,
    /// The sink failed to load or play the current source.
    ///
    /// Cross-origin denial surfaces here: the sink reports it the same way as
    /// any other unplayable source.
    Error {
        /// Platform error description.
        message: String,
    },
    /// Periodic position report while playing.
    TimeUpdate {
        /// Current position in seconds.
        position: f64,
        /// Total duration in seconds, if known.
        duration: f64,
    },
}

/// Platform media-playback primitive.
///
/// Implementations own exactly one source at a time; [`load`](AudioSink::load)
/// replaces any previous source and resets the position to zero.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::sink::{AudioSink, SinkEvent};
///
/// async fn play_url(sink: &dyn AudioSink, url: &str) -> Result<()> {
///     sink.load(url).await?;
///     sink.play().await
/// }
/// ```
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Load a source URL, replacing the current one.
    ///
    /// Implementations may resolve immediately and report fetch/decode
    /// problems later through [`SinkEvent::Error`]; the engine handles both
    /// paths.
    async fn load(&self, url: &str) -> Result<()>;

    /// Begin or resume playback of the loaded source.
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the position.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    async fn seek_to(&self, position_secs: f64) -> Result<()>;

    /// Current playback position in seconds.
    async fn current_time(&self) -> Result<f64>;

    /// Duration of the loaded source in seconds, if known yet.
    async fn duration(&self) -> Result<Option<f64>>;

    /// Subscribe to the sink's event stream.
    ///
    /// Each call returns an independent receiver; past events are not
    /// replayed.
    fn subscribe_events(&self) -> broadcast::Receiver<SinkEvent>;
}
