//! Direct audio URL discovery
//!
//! Song pages expose the playable resource in one of several places. The
//! cascade below probes them in priority order as `(name, rule)` pairs; the
//! first rule producing a candidate wins and the result is resolved against
//! the site origin.

use crate::error::Result;
use crate::resolve::resolve_url;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// File extensions treated as directly playable audio.
pub const AUDIO_EXTENSIONS: [&str; 5] = [".mp3", ".wav", ".ogg", ".flac", ".m4a"];

type AudioRule = fn(&Html, &str) -> Result<Option<String>>;

/// Probe order. Rules are tried top to bottom, first hit wins.
const AUDIO_RULES: [(&str, AudioRule); 6] = [
    ("play-marker", from_play_marker),
    ("audio-source", from_audio_source),
    ("audio-src", from_audio_src),
    ("data-attribute", from_data_attributes),
    ("anchor", from_audio_anchor),
    ("script-scan", from_script_text),
];

/// Find the playable audio URL in a song page, if any.
///
/// Returns the first candidate of the cascade, resolved against `origin`.
/// `download_host_fragment` names the substring identifying the site's file
/// host, used by the loose rules that cannot rely on a file extension.
pub fn find_audio_url(
    html: &str,
    origin: &str,
    download_host_fragment: &str,
) -> Result<Option<String>> {
    let doc = Html::parse_document(html);

    for (rule, extract) in AUDIO_RULES {
        if let Some(found) = extract(&doc, download_host_fragment)? {
            let resolved = resolve_url(&found, origin);
            debug!(rule, url = %resolved, "Audio URL discovered");
            return Ok(Some(resolved));
        }
    }

    debug!("No audio URL in page");
    Ok(None)
}

/// Whether the URL's path carries one of [`AUDIO_EXTENSIONS`].
pub fn has_audio_extension(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Whether a URL looks directly playable: an audio extension, or a host
/// matching the site's download-host fragment.
pub fn looks_like_audio_url(url: &str, download_host_fragment: &str) -> bool {
    if has_audio_extension(url) {
        return true;
    }
    if download_host_fragment.is_empty() {
        return false;
    }
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .host_str()
                .map(|host| host.contains(download_host_fragment))
        })
        .unwrap_or(false)
}

/// Rule 1: the page's play control carries the URL directly.
fn from_play_marker(doc: &Html, _download_host_fragment: &str) -> Result<Option<String>> {
    let selector = Selector::parse(".play-button[data-audio]")?;
    Ok(first_attr(doc, &selector, "data-audio"))
}

/// Rule 2: a nested `<source>` of an audio element, extension-gated.
fn from_audio_source(doc: &Html, _download_host_fragment: &str) -> Result<Option<String>> {
    let selector = Selector::parse("audio source[src]")?;
    Ok(doc
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .map(str::trim)
        .find(|src| has_audio_extension(src))
        .map(ToString::to_string))
}

/// Rule 3: the audio element's own `src`, taken on trust.
fn from_audio_src(doc: &Html, _download_host_fragment: &str) -> Result<Option<String>> {
    let selector = Selector::parse("audio[src]")?;
    Ok(first_attr(doc, &selector, "src"))
}

/// Rule 4: generic data attributes anywhere in the page, value-gated.
fn from_data_attributes(doc: &Html, download_host_fragment: &str) -> Result<Option<String>> {
    let selector = Selector::parse("[data-audio], [data-src]")?;
    Ok(doc
        .select(&selector)
        .filter_map(|el| {
            el.value()
                .attr("data-audio")
                .or_else(|| el.value().attr("data-src"))
        })
        .map(str::trim)
        .find(|value| looks_like_audio_url(value, download_host_fragment))
        .map(ToString::to_string))
}

/// Rule 5: download-style anchors, extension-gated.
fn from_audio_anchor(doc: &Html, _download_host_fragment: &str) -> Result<Option<String>> {
    let selector = Selector::parse("a[href]")?;
    Ok(doc
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .find(|href| has_audio_extension(href))
        .map(ToString::to_string))
}

/// Rule 6: last resort, scan embedded script text for an absolute URL that
/// looks playable.
fn from_script_text(doc: &Html, download_host_fragment: &str) -> Result<Option<String>> {
    let selector = Selector::parse("script")?;
    let pattern = Regex::new(r#"https?://[^\s"'<>\\]+"#)?;

    for script in doc.select(&selector) {
        let text: String = script.text().collect();
        for m in pattern.find_iter(&text) {
            let candidate = m.as_str().trim_end_matches([',', ';', ')']);
            if looks_like_audio_url(candidate, download_host_fragment) {
                return Ok(Some(candidate.to_string()));
            }
        }
    }

    Ok(None)
}

/// First non-blank value of `name` among elements matching `selector`.
fn first_attr(doc: &Html, selector: &Selector, name: &str) -> Option<String> {
    doc.select(selector)
        .filter_map(|el| el.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToString::to_string)
}
