//! # Core Catalog
//!
//! Orchestration services that turn the site into a browsable catalog:
//! search, explore listings, and lyrics. Each service composes the proxy
//! fetcher, the extraction cascades, and one of the library's caches into a
//! single call the player shell can drive.
//!
//! ## Design
//!
//! - Cache-first: explore and lyrics consult their cache before touching the
//!   network, and only a `force` flag bypasses a fresh entry.
//! - Extraction misses stay misses: an unparseable search page degrades to
//!   the placeholder row, absent lyrics come back as `None`. Only fetch
//!   exhaustion and invalid input surface as errors.
//! - Caches are shared, not owned: services hold `Arc<Mutex<..>>` handles so
//!   the embedding player can snapshot the same stores for persistence.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_catalog::SearchService;
//!
//! let search = SearchService::new(fetcher, history, site, clock);
//! let page = search.search("rain clouds").await?;
//! for track in &page.tracks {
//!     println!("{}", track.title);
//! }
//! ```

pub mod error;
pub mod explore;
pub mod lyrics;
pub mod search;

pub use error::{CatalogError, Result};
pub use explore::{ExploreOutcome, ExploreService};
pub use lyrics::LyricsService;
pub use search::SearchService;
