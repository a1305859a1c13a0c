//! URL normalization and track identity
//!
//! Every equality decision in the library (favorite membership, duplicate
//! prevention, cache keys) runs through [`normalize_url`]: origin plus path,
//! query and fragment stripped. Track ids are never consulted.

use crate::models::Track;
use url::Url;

/// Normalize a URL to its identity form: origin + path, no query, no fragment.
///
/// Absolute URLs are parsed properly (so the host is lowercased and default
/// ports drop out). Strings that don't parse as absolute URLs, relative paths
/// included, just have everything from the first `?` or `#` removed.
///
/// The function is idempotent: `normalize_url(&normalize_url(u)) == normalize_url(u)`.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() => {
            format!("{}{}", parsed.origin().ascii_serialization(), parsed.path())
        }
        _ => {
            let without_query = trimmed.split('?').next().unwrap_or(trimmed);
            let without_fragment = without_query.split('#').next().unwrap_or(without_query);
            without_fragment.to_string()
        }
    }
}

/// Whether two tracks refer to the same site entity.
///
/// True iff any of the following normalized comparisons match, with empty
/// values never matching anything:
/// - `a.url == b.url`
/// - `a.page_url == b.page_url`
/// - `a.url == b.page_url` or `b.url == a.page_url`
///
/// The relation is symmetric. Track ids are deliberately ignored: they are
/// re-derived on every fetch.
pub fn is_same_track(a: &Track, b: &Track) -> bool {
    let a_url = normalize_url(&a.url);
    let b_url = normalize_url(&b.url);
    let a_page = a.page_url.as_deref().map(normalize_url).unwrap_or_default();
    let b_page = b.page_url.as_deref().map(normalize_url).unwrap_or_default();

    (!a_url.is_empty() && a_url == b_url)
        || (!a_page.is_empty() && a_page == b_page)
        || (!a_url.is_empty() && a_url == b_page)
        || (!b_url.is_empty() && b_url == a_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_query_and_fragment() {
        assert_eq!(
            normalize_url("https://music.example.com/song/1?ref=search&page=2#player"),
            "https://music.example.com/song/1"
        );
        assert_eq!(
            normalize_url("https://music.example.com/song/1"),
            "https://music.example.com/song/1"
        );
    }

    #[test]
    fn test_normalize_lowercases_host_keeps_path_case() {
        assert_eq!(
            normalize_url("https://Music.Example.COM/Song/One"),
            "https://music.example.com/Song/One"
        );
    }

    #[test]
    fn test_normalize_handles_relative_urls() {
        assert_eq!(normalize_url("/song/1?x=2"), "/song/1");
        assert_eq!(normalize_url("song/1#top"), "song/1");
        assert_eq!(normalize_url(""), "");
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://music.example.com/song/1?ref=search#x",
            "https://Music.Example.com:443/Song",
            "http://music.example.com:8080/song/1",
            "/relative/path?q=1",
            "no-scheme-at-all",
            "",
        ];

        for input in inputs {
            let once = normalize_url(input);
            let twice = normalize_url(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_same_track_by_url() {
        let a = Track::new(1, "Evening Rain", "Mara Lane", "https://music.example.com/song/1?a=1");
        let b = Track::new(2, "Evening Rain", "Mara Lane", "https://music.example.com/song/1#x");
        assert!(is_same_track(&a, &b));
    }

    #[test]
    fn test_same_track_by_cross_match() {
        // a's direct audio url with page fallback; b only knows the page
        let a = Track::new(1, "Evening Rain", "", "https://cdn.example.com/files/1.mp3")
            .with_page_url("https://music.example.com/song/1");
        let b = Track::new(2, "Evening Rain", "", "https://music.example.com/song/1?hl=en");
        assert!(is_same_track(&a, &b));
        assert!(is_same_track(&b, &a));
    }

    #[test]
    fn test_same_track_is_symmetric() {
        let tracks = [
            Track::new(1, "A", "", "https://music.example.com/song/1"),
            Track::new(2, "B", "", "https://music.example.com/song/2")
                .with_page_url("https://music.example.com/song/1"),
            Track::new(3, "C", "", "").with_page_url("https://music.example.com/song/2"),
            Track::new(4, "D", "", "https://other.example.net/x"),
        ];

        for a in &tracks {
            for b in &tracks {
                assert_eq!(
                    is_same_track(a, b),
                    is_same_track(b, a),
                    "asymmetric for {:?} vs {:?}",
                    a.title,
                    b.title
                );
            }
        }
    }

    #[test]
    fn test_empty_urls_never_match() {
        let a = Track::new(1, "A", "", "");
        let b = Track::new(2, "B", "", "");
        assert!(!is_same_track(&a, &b));
    }

    #[test]
    fn test_ids_are_ignored() {
        let a = Track::new(42, "Evening Rain", "", "https://music.example.com/song/1");
        let b = Track::new(42, "Other Song", "", "https://music.example.com/song/2");
        assert!(!is_same_track(&a, &b));
    }
}
