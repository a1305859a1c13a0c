//! Search result and explore listing extraction
//!
//! Listing pages repeat `div.song-item` blocks. Each block is read
//! attributes-first (`data-title`, `data-artist`, `data-image`, `data-audio`)
//! with nested anchor/image markup as the fallback, and is accepted only when
//! it yields both a title and a usable URL. Malformed blocks are skipped, not
//! reported.

use crate::error::Result;
use crate::resolve::resolve_url;
use core_library::Track;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Title of the placeholder row returned when a search page parses to
/// nothing. Searches never hard-fail; an unparseable page degrades to this
/// single sentinel row.
pub const NO_RESULTS_TITLE: &str = "No results found";

/// One extracted listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub tracks: Vec<Track>,
    /// Whether the page advertises further result pages.
    pub has_more: bool,
}

/// Extract search results plus a pagination flag.
///
/// Track ids are minted as `id_seed + position`; they are unique within the
/// returned page but not stable across fetches, so callers must compare
/// tracks by URL, never by id.
///
/// If no block validates, the page degrades to a single placeholder row
/// titled [`NO_RESULTS_TITLE`] whose `url` is the site origin.
pub fn extract_search_results(html: &str, origin: &str, id_seed: i64) -> Result<SearchPage> {
    let doc = Html::parse_document(html);

    let tracks = collect_items(&doc, origin, id_seed)?;
    let has_more = detect_pagination(&doc)?;
    debug!(tracks = tracks.len(), has_more, "Search page extracted");

    if tracks.is_empty() {
        return Ok(SearchPage {
            tracks: vec![Track::new(id_seed, NO_RESULTS_TITLE, "", origin)],
            has_more,
        });
    }

    Ok(SearchPage { tracks, has_more })
}

/// Extract an explore/browse listing.
///
/// Same block cascade as search, but an empty page stays empty: explore
/// callers fall back to cached listings instead of showing a sentinel row.
pub fn extract_explore_items(html: &str, origin: &str, id_seed: i64) -> Result<Vec<Track>> {
    let doc = Html::parse_document(html);
    let items = collect_items(&doc, origin, id_seed)?;
    debug!(items = items.len(), "Explore listing extracted");
    Ok(items)
}

fn collect_items(doc: &Html, origin: &str, id_seed: i64) -> Result<Vec<Track>> {
    let block_selector = Selector::parse("div.song-item")?;
    let anchor_selector = Selector::parse("a[href]")?;
    let image_selector = Selector::parse("img[src]")?;
    let artist_selector = Selector::parse(".artist")?;

    let mut tracks = Vec::new();
    for block in doc.select(&block_selector) {
        let id = id_seed + tracks.len() as i64;
        if let Some(track) = read_block(
            &block,
            origin,
            id,
            &anchor_selector,
            &image_selector,
            &artist_selector,
        ) {
            tracks.push(track);
        }
    }

    Ok(tracks)
}

/// Read one listing block; `None` when it lacks a title or a usable URL.
fn read_block(
    block: &ElementRef<'_>,
    origin: &str,
    id: i64,
    anchor_selector: &Selector,
    image_selector: &Selector,
    artist_selector: &Selector,
) -> Option<Track> {
    let title = attr_value(block, "data-title")
        .or_else(|| anchor_text(block, anchor_selector))?;

    let artist = attr_value(block, "data-artist")
        .or_else(|| element_text(block, artist_selector))
        .unwrap_or_default();

    let image = attr_value(block, "data-image")
        .or_else(|| {
            block
                .select(image_selector)
                .filter_map(|img| img.value().attr("src"))
                .map(str::trim)
                .find(|src| !src.is_empty())
                .map(ToString::to_string)
        })
        .map(|src| resolve_url(&src, origin));

    let audio = attr_value(block, "data-audio").map(|src| resolve_url(&src, origin));
    let page = first_usable_href(block, anchor_selector).map(|href| resolve_url(&href, origin));

    let mut track = match (audio, page) {
        (Some(audio), Some(page)) => Track::new(id, title, artist, audio).with_page_url(page),
        (Some(audio), None) => Track::new(id, title, artist, audio),
        (None, Some(page)) => Track::new(id, title, artist, page),
        (None, None) => return None,
    };

    if let Some(image) = image {
        track = track.with_image(image);
    }

    Some(track)
}

/// Non-blank trimmed attribute value.
fn attr_value(block: &ElementRef<'_>, name: &str) -> Option<String> {
    block
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// First anchor with non-blank text content.
fn anchor_text(block: &ElementRef<'_>, anchor_selector: &Selector) -> Option<String> {
    block
        .select(anchor_selector)
        .map(|anchor| anchor.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty())
}

/// Trimmed text of the first element matching `selector`.
fn element_text(block: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    block
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// First href that actually points somewhere.
fn first_usable_href(block: &ElementRef<'_>, anchor_selector: &Selector) -> Option<String> {
    block
        .select(anchor_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:"))
        .map(ToString::to_string)
}

/// Whether the page advertises more result pages: a dedicated "next" link, or
/// more than one page-number link.
fn detect_pagination(doc: &Html) -> Result<bool> {
    let next_selector = Selector::parse(r#"a.next, a[rel="next"]"#)?;
    if doc.select(&next_selector).next().is_some() {
        return Ok(true);
    }

    let pages_selector = Selector::parse("div.pagination a")?;
    Ok(doc.select(&pages_selector).count() > 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://music.example.com";

    const SEARCH_PAGE: &str = r##"
        <html><body>
          <div class="results">
            <div class="song-item" data-title="Rain Falls" data-artist="The Clouds"
                 data-image="/covers/rain.jpg" data-audio="/audio/rain.mp3">
              <a href="/song/rain-falls">Rain Falls</a>
            </div>
            <div class="song-item">
              <a href="/song/blue-sky"><img src="/covers/sky.jpg">Blue Sky</a>
              <span class="artist">The Clouds</span>
            </div>
            <div class="song-item" data-title="Thunder">
              <a href="/song/thunder">Thunder</a>
            </div>
            <div class="song-item">
              <a href="/song/broken"><img src="/covers/broken.jpg"></a>
            </div>
          </div>
          <div class="pagination">
            <a href="?q=rain&page=1">1</a>
            <a href="?q=rain&page=2">2</a>
            <a href="?q=rain&page=3">3</a>
          </div>
        </body></html>
    "##;

    #[test]
    fn test_malformed_block_is_skipped() {
        let page = extract_search_results(SEARCH_PAGE, ORIGIN, 100).unwrap();

        // The fourth block has no title anywhere and is dropped.
        assert_eq!(page.tracks.len(), 3);
        assert!(page.has_more);

        let titles: Vec<&str> = page.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Rain Falls", "Blue Sky", "Thunder"]);
    }

    #[test]
    fn test_attributes_win_over_nested_markup() {
        let page = extract_search_results(SEARCH_PAGE, ORIGIN, 100).unwrap();
        let first = &page.tracks[0];

        assert_eq!(first.title, "Rain Falls");
        assert_eq!(first.artist, "The Clouds");
        assert_eq!(
            first.image.as_deref(),
            Some("https://music.example.com/covers/rain.jpg")
        );
        // data-audio becomes the playable url, the anchor becomes the page.
        assert_eq!(first.url, "https://music.example.com/audio/rain.mp3");
        assert_eq!(
            first.page_url.as_deref(),
            Some("https://music.example.com/song/rain-falls")
        );
    }

    #[test]
    fn test_nested_markup_fallback() {
        let page = extract_search_results(SEARCH_PAGE, ORIGIN, 100).unwrap();
        let second = &page.tracks[1];

        assert_eq!(second.title, "Blue Sky");
        assert_eq!(second.artist, "The Clouds");
        assert_eq!(
            second.image.as_deref(),
            Some("https://music.example.com/covers/sky.jpg")
        );
        assert_eq!(second.url, "https://music.example.com/song/blue-sky");
        assert_eq!(second.page_url, None);
    }

    #[test]
    fn test_missing_artist_is_empty_not_rejected() {
        let page = extract_search_results(SEARCH_PAGE, ORIGIN, 100).unwrap();
        let third = &page.tracks[2];

        assert_eq!(third.title, "Thunder");
        assert_eq!(third.artist, "");
        assert_eq!(third.image, None);
    }

    #[test]
    fn test_ids_are_seed_plus_position() {
        let page = extract_search_results(SEARCH_PAGE, ORIGIN, 5_000).unwrap();

        let ids: Vec<i64> = page.tracks.iter().map(|t| t.id).collect();
        assert_eq!(ids, [5_000, 5_001, 5_002]);
    }

    #[test]
    fn test_unparseable_page_degrades_to_placeholder_row() {
        let page = extract_search_results("<html><body><p>nope</p></body></html>", ORIGIN, 7)
            .unwrap();

        assert_eq!(page.tracks.len(), 1);
        assert_eq!(page.tracks[0].title, NO_RESULTS_TITLE);
        assert_eq!(page.tracks[0].url, ORIGIN);
        assert_eq!(page.tracks[0].id, 7);
        assert!(!page.has_more);
    }

    #[test]
    fn test_next_link_alone_means_more_pages() {
        let html = r#"
            <div class="song-item" data-title="One"><a href="/song/1">One</a></div>
            <a rel="next" href="?page=2">Next</a>
        "#;
        let page = extract_search_results(html, ORIGIN, 1).unwrap();
        assert!(page.has_more);

        let html = r#"
            <div class="song-item" data-title="One"><a href="/song/1">One</a></div>
            <a class="next" href="?page=2">&raquo;</a>
        "#;
        let page = extract_search_results(html, ORIGIN, 1).unwrap();
        assert!(page.has_more);
    }

    #[test]
    fn test_single_page_number_is_not_pagination() {
        let html = r#"
            <div class="song-item" data-title="One"><a href="/song/1">One</a></div>
            <div class="pagination"><a href="?page=1">1</a></div>
        "#;
        let page = extract_search_results(html, ORIGIN, 1).unwrap();
        assert!(!page.has_more);
    }

    #[test]
    fn test_fragment_and_javascript_hrefs_are_not_usable() {
        let html = r##"
            <div class="song-item" data-title="One">
              <a href="#">play</a>
              <a href="javascript:void(0)">share</a>
              <a href="/song/1">One</a>
            </div>
        "##;
        let page = extract_search_results(html, ORIGIN, 1).unwrap();

        assert_eq!(page.tracks.len(), 1);
        assert_eq!(page.tracks[0].url, "https://music.example.com/song/1");
    }

    #[test]
    fn test_explore_shares_the_block_cascade() {
        let items = extract_explore_items(SEARCH_PAGE, ORIGIN, 100).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Rain Falls");
    }

    #[test]
    fn test_empty_explore_page_stays_empty() {
        let items = extract_explore_items("<html><body></body></html>", ORIGIN, 1).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_protocol_relative_audio_resolves_with_origin_scheme() {
        let html = r#"
            <div class="song-item" data-title="Cdn Song" data-audio="//cdn.example.net/c.mp3">
              <a href="/song/cdn">Cdn Song</a>
            </div>
        "#;
        let page = extract_search_results(html, ORIGIN, 1).unwrap();

        assert_eq!(page.tracks[0].url, "https://cdn.example.net/c.mp3");
    }
}
