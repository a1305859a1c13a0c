//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the player core and platform-specific
//! implementations. Each trait represents a capability the core requires but that
//! must be implemented differently per host (desktop shell, embedded webview,
//! test harness).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpTransport`](http::HttpTransport) - Plain-text HTTP GET used by the proxy fetch layer
//! - [`StateStore`](storage::StateStore) - Key-value persistence for serialized snapshots
//!
//! ### Media
//! - [`AudioSink`](sink::AudioSink) - The platform media element: load/play/pause/seek plus
//!   `ended`/`error`/`timeupdate` events
//! - [`AudioWarmupCache`](cache::AudioWarmupCache) - Best-effort, non-blocking engagement of
//!   the platform byte cache for an audio URL
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Implementing a Bridge
//!
//! Hosts implement each trait with `async_trait` and hand the result to the
//! core as an `Arc<dyn ...>`:
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bridge_traits::error::Result;
//! use bridge_traits::http::HttpTransport;
//!
//! struct HostTransport { /* host HTTP stack */ }
//!
//! #[async_trait]
//! impl HttpTransport for HostTransport {
//!     async fn get_text(&self, url: &str) -> Result<String> {
//!         // delegate to the host HTTP stack
//!         # unimplemented!()
//!     }
//! }
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific errors to `BridgeError` and
//! provide actionable messages with context (URLs, file paths).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod cache;
pub mod error;
pub mod http;
pub mod sink;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use cache::AudioWarmupCache;
pub use http::HttpTransport;
pub use sink::{AudioSink, SinkEvent};
pub use storage::StateStore;
pub use time::{Clock, SystemClock};
