//! Relative URL resolution against the site origin

use url::Url;

/// Resolve an href the way a browser would, against the configured origin.
///
/// Absolute URLs pass through untouched; protocol-relative and path-relative
/// forms resolve against `origin`. Inputs that cannot be resolved (for
/// example when the origin itself is not a URL) are returned as-is rather
/// than dropped, so callers can still validate them downstream.
pub fn resolve_url(href: &str, origin: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    if let Ok(base) = Url::parse(origin) {
        if let Ok(resolved) = base.join(href) {
            return resolved.to_string();
        }
    }

    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://music.example.com";

    #[test]
    fn test_absolute_url_passes_through() {
        assert_eq!(
            resolve_url("https://cdn.example.net/a.mp3", ORIGIN),
            "https://cdn.example.net/a.mp3"
        );
    }

    #[test]
    fn test_root_relative_path() {
        assert_eq!(
            resolve_url("/song/123", ORIGIN),
            "https://music.example.com/song/123"
        );
    }

    #[test]
    fn test_bare_relative_path() {
        assert_eq!(
            resolve_url("track.mp3", ORIGIN),
            "https://music.example.com/track.mp3"
        );
    }

    #[test]
    fn test_protocol_relative_uses_origin_scheme() {
        assert_eq!(
            resolve_url("//cdn.example.net/a.mp3", ORIGIN),
            "https://cdn.example.net/a.mp3"
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(
            resolve_url("  /song/9  ", ORIGIN),
            "https://music.example.com/song/9"
        );
    }

    #[test]
    fn test_empty_href_stays_empty() {
        assert_eq!(resolve_url("", ORIGIN), "");
        assert_eq!(resolve_url("   ", ORIGIN), "");
    }

    #[test]
    fn test_unresolvable_origin_returns_href_verbatim() {
        assert_eq!(resolve_url("/song/1", "not a url"), "/song/1");
    }
}
