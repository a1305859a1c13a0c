//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `HttpTransport` using `reqwest`
//! - `StateStore` as a JSON file under the platform data directory
//! - `AudioWarmupCache` as a detached `reqwest` prefetch
//!
//! The one capability with no desktop default is the audio sink itself:
//! actual audio output is owned by whichever shell embeds the core, so hosts
//! always inject their own [`AudioSink`](bridge_traits::sink::AudioSink).
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HttpWarmupCache, JsonFileStateStore, ReqwestTransport};
//!
//! let transport = ReqwestTransport::new();
//! let store = JsonFileStateStore::open_default()?;
//! let warmup = HttpWarmupCache::new();
//! // Hand these to `CoreDependencies` together with a host `AudioSink`.
//! ```

mod http;
mod store;
mod warmup;

pub use http::ReqwestTransport;
pub use store::JsonFileStateStore;
pub use warmup::HttpWarmupCache;
