//! # Core Extract
//!
//! HTML extraction for one music site's markup conventions. Every function
//! here is pure: markup text in, typed records out. Nothing fetches, nothing
//! caches.
//!
//! ## Design
//!
//! All extractors follow the same shape: an ordered cascade of heuristics
//! evaluated in sequence, first success wins, otherwise `None`/empty. A miss
//! is a normal result, never an error. The only error condition is an invalid
//! selector or pattern, which indicates a bug in this crate rather than bad
//! input.
//!
//! ## Site conventions
//!
//! - Listing pages repeat `div.song-item` blocks carrying `data-title`,
//!   `data-artist`, `data-image` and `data-audio` attributes, with nested
//!   anchor/image markup as the fallback source.
//! - Lyrics pages hold the text in `div.lyric-content` (older pages use
//!   `#lyrics`), as bare text nodes separated by `<br>` after the heading
//!   block.
//! - Song pages expose the playable URL through one of several places, probed
//!   in priority order by [`find_audio_url`].
//!
//! ## Usage
//!
//! ```no_run
//! use core_extract::{extract_search_results, find_audio_url};
//!
//! # fn demo(html: &str) -> core_extract::Result<()> {
//! let page = extract_search_results(html, "https://music.example.com", 1_700_000_000_000)?;
//! for track in &page.tracks {
//!     println!("{} - {}", track.artist, track.title);
//! }
//! let audio = find_audio_url(html, "https://music.example.com", "download")?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod error;
pub mod listing;
pub mod lyrics;
pub mod resolve;

pub use audio::{find_audio_url, has_audio_extension, looks_like_audio_url, AUDIO_EXTENSIONS};
pub use error::{ExtractError, Result};
pub use listing::{extract_explore_items, extract_search_results, SearchPage, NO_RESULTS_TITLE};
pub use lyrics::extract_lyrics;
pub use resolve::resolve_url;
