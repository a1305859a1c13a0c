//! # Playback Error Types

use bridge_traits::error::BridgeError;
use core_extract::ExtractError;
use core_fetch::FetchError;
use thiserror::Error;

/// Errors from resolving and playing tracks.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// No playable audio URL could be produced for a track: its page could
    /// not be fetched through any proxy, or the page yielded nothing.
    #[error("Could not resolve a playable source for \"{title}\": {reason}")]
    Resolution { title: String, reason: String },

    /// The platform audio sink refused an operation.
    #[error("Audio sink error: {0}")]
    Sink(#[from] BridgeError),

    /// Play was requested with no usable track (empty playlist or bad index).
    #[error("Nothing to play")]
    NothingToPlay,

    /// Proxy fetch failed while resolving a page.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// HTML extraction failed (selector or pattern error, not a miss).
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl PlaybackError {
    /// Whether the failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::Fetch(e) => e.is_transient(),
            PlaybackError::Sink(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
