//! # Playback Module
//!
//! Playlist navigation and sink-driving logic for the player core.
//!
//! ## Overview
//!
//! This module handles:
//! - The playback session state machine (selection, shuffle, repeat)
//! - Resolving tracks to playable URLs (direct audio or page extraction)
//! - Driving the platform [`AudioSink`](bridge_traits::sink::AudioSink) and
//!   reacting to its events, including the one-shot page fallback after a
//!   failed direct-URL attempt

pub mod engine;
pub mod error;
pub mod resolver;
pub mod session;

pub use engine::PlayerEngine;
pub use error::{PlaybackError, Result};
pub use resolver::TrackResolver;
pub use session::{EndAction, PlaybackSession, RepeatMode, SessionStep};
