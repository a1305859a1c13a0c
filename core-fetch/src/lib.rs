//! # Fetch Resilience Layer
//!
//! Retrieves pages from the scraped site through CORS-bypass proxy backends.
//!
//! ## Overview
//!
//! The site itself refuses cross-origin requests, so every page is fetched
//! through one of several public proxies. Proxies are flaky in different ways
//! at different times, which drives the strategy here:
//!
//! - All configured proxies are raced concurrently; the first success wins
//!   and the rest are abandoned (left to finish, results discarded).
//! - Each individual attempt is bounded by a timeout; a timed-out attempt is
//!   cancelled and counted as failed.
//! - When a whole round fails, the race is retried with linear backoff
//!   before [`FetchError::AllProxiesFailed`] is surfaced.
//!
//! Responses are unwrapped per backend: JSON-envelope proxies return
//! `{ "contents": "<html>" }`, raw proxies return the page body directly.
//! An empty body is treated as a failure either way.
//!
//! Nothing here caches; callers own that.

pub mod error;
pub mod fetcher;

pub use error::{FetchError, ProxyFailure, Result};
pub use fetcher::ProxyFetcher;
