//! # Track Source Resolution
//!
//! Decides which URL the audio sink gets for a track. Listing extraction
//! produces tracks whose `url` is either a direct audio resource or a page;
//! the policy here mirrors that split:
//!
//! - a `url` that already looks playable (audio extension or download host)
//!   is handed to the sink as-is;
//! - anything else goes through page resolution: fetch the page via the
//!   proxy layer and run the audio-discovery cascade over its HTML;
//! - when a direct attempt fails at playback time, the engine retries once
//!   through `page_url` ([`TrackResolver::resolve_from_fallback_page`]).

use std::sync::Arc;

use core_extract::{find_audio_url, looks_like_audio_url};
use core_fetch::ProxyFetcher;
use core_library::models::Track;
use core_runtime::config::SiteConfig;
use tracing::{debug, info};

use crate::error::{PlaybackError, Result};

/// Resolves tracks to playable URLs using the proxy fetch layer and the
/// audio-discovery cascade.
#[derive(Debug)]
pub struct TrackResolver {
    fetcher: Arc<ProxyFetcher>,
    site: SiteConfig,
}

impl TrackResolver {
    pub fn new(fetcher: Arc<ProxyFetcher>, site: SiteConfig) -> Self {
        Self { fetcher, site }
    }

    /// Whether the track's own `url` already looks directly playable.
    pub fn is_direct(&self, track: &Track) -> bool {
        !track.url.trim().is_empty()
            && looks_like_audio_url(&track.url, &self.site.download_host_fragment)
    }

    /// Resolve a playable URL through the track's page (`page_url` when
    /// present, otherwise `url`).
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Resolution`] when the track has no page at all or the
    /// page yields no audio URL; fetch and extraction failures pass through.
    pub async fn resolve_from_page(&self, track: &Track) -> Result<String> {
        let Some(page) = track.page_or_url() else {
            return Err(unresolvable(track, "track has no page to resolve"));
        };
        self.extract_from(track, page).await
    }

    /// Resolve strictly through `page_url`, for the retry after a direct
    /// `url` failed at the sink. The broken direct URL is not worth
    /// refetching as a page, so a track without `page_url` fails here.
    pub async fn resolve_from_fallback_page(&self, track: &Track) -> Result<String> {
        match track.page_url.as_deref() {
            Some(page) if !page.trim().is_empty() => self.extract_from(track, page).await,
            _ => Err(unresolvable(
                track,
                "direct playback failed and the track has no fallback page",
            )),
        }
    }

    async fn extract_from(&self, track: &Track, page: &str) -> Result<String> {
        debug!(title = %track.title, page = %page, "Resolving audio through page");
        let body = self.fetcher.fetch_content(page).await?;
        match find_audio_url(&body, &self.site.origin, &self.site.download_host_fragment)? {
            Some(url) => {
                info!(title = %track.title, "Resolved a playable source");
                Ok(url)
            }
            None => Err(unresolvable(track, "page contains no recognizable audio URL")),
        }
    }
}

fn unresolvable(track: &Track, reason: &str) -> PlaybackError {
    PlaybackError::Resolution {
        title: track.title.clone(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpTransport;
    use core_runtime::config::{FetchConfig, ProxyEndpoint, ProxyResponseKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    const SONG_PAGE: &str = r#"
        <html><body>
          <h1>Rain Falls</h1>
          <audio><source src="/files/rain-falls.mp3" type="audio/mpeg"></audio>
        </body></html>
    "#;

    const BARE_PAGE: &str = "<html><body><p>Nothing playable here.</p></body></html>";

    struct RecordingTransport {
        calls: AtomicUsize,
        urls: StdMutex<Vec<String>>,
        body: &'static str,
    }

    impl RecordingTransport {
        fn new(body: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                urls: StdMutex::new(Vec::new()),
                body,
            }
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for RecordingTransport {
        async fn get_text(&self, url: &str) -> bridge_traits::error::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            if self.body.is_empty() {
                return Err(BridgeError::OperationFailed("no body scripted".into()));
            }
            Ok(self.body.to_string())
        }
    }

    fn resolver_with(transport: Arc<RecordingTransport>) -> TrackResolver {
        let config = FetchConfig {
            proxies: vec![ProxyEndpoint::new(
                "raw",
                "https://raw.test/{url}",
                ProxyResponseKind::Raw,
            )],
            attempt_timeout_ms: 3000,
            max_retries: 0,
            retry_backoff_ms: 500,
        };
        let site = SiteConfig {
            origin: "https://music.example.com".to_string(),
            search_path: "/search".to_string(),
            download_host_fragment: "download".to_string(),
        };
        TrackResolver::new(Arc::new(ProxyFetcher::new(transport, config)), site)
    }

    #[test]
    fn direct_detection_uses_extension_and_download_host() {
        let resolver = resolver_with(Arc::new(RecordingTransport::new("")));
        let by_ext = Track::new(1, "A", "", "https://cdn.example.net/a.mp3");
        let by_host = Track::new(2, "B", "", "https://download.example.net/stream/42");
        let page = Track::new(3, "C", "", "https://music.example.com/song/rain-falls");
        assert!(resolver.is_direct(&by_ext));
        assert!(resolver.is_direct(&by_host));
        assert!(!resolver.is_direct(&page));
    }

    #[tokio::test]
    async fn resolves_audio_from_the_track_page() {
        let transport = Arc::new(RecordingTransport::new(SONG_PAGE));
        let resolver = resolver_with(transport.clone());
        let track = Track::new(1, "Rain Falls", "", "https://music.example.com/song/rain-falls");

        let url = resolver.resolve_from_page(&track).await.unwrap();
        assert_eq!(url, "https://music.example.com/files/rain-falls.mp3");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prefers_page_url_over_url_for_resolution() {
        let transport = Arc::new(RecordingTransport::new(SONG_PAGE));
        let resolver = resolver_with(transport.clone());
        let track = Track::new(1, "Rain Falls", "", "https://cdn.example.net/broken.mp3")
            .with_page_url("https://music.example.com/song/rain-falls");

        resolver.resolve_from_page(&track).await.unwrap();
        let fetched = transport.urls.lock().unwrap().last().cloned().unwrap();
        assert!(fetched.contains("rain-falls"));
        assert!(!fetched.contains("broken.mp3"));
    }

    #[tokio::test]
    async fn page_without_audio_is_a_resolution_error() {
        let resolver = resolver_with(Arc::new(RecordingTransport::new(BARE_PAGE)));
        let track = Track::new(1, "Rain Falls", "", "https://music.example.com/song/rain-falls");

        let err = resolver.resolve_from_page(&track).await.unwrap_err();
        match err {
            PlaybackError::Resolution { title, reason } => {
                assert_eq!(title, "Rain Falls");
                assert!(reason.contains("no recognizable audio URL"));
            }
            other => panic!("expected Resolution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fallback_without_page_url_fails_before_any_fetch() {
        let transport = Arc::new(RecordingTransport::new(SONG_PAGE));
        let resolver = resolver_with(transport.clone());
        let track = Track::new(1, "Rain Falls", "", "https://cdn.example.net/rain.mp3");

        let err = resolver.resolve_from_fallback_page(&track).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Resolution { .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
