//! Logging system demonstration
//!
//! Shows the logging infrastructure in the shapes the player core uses it:
//! structured fetch/extract/playback events under spans.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format
//! cargo run --example logging_demo -- compact
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use core_runtime::logging::{elide, init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::{debug, info, instrument, span, trace, warn, Level};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = if args.len() > 1 {
        match args[1].as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    } else {
        LogFormat::default()
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);

    if let Some(filter) = args.get(2).cloned() {
        config = config.with_filter(filter);
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");

    demo_fetch_race().await;
    demo_extraction();
    demo_playback().await;

    info!("Demo complete");
}

/// The proxy race logs one debug line per attempt and a warn per failed round.
async fn demo_fetch_race() {
    let span = span!(Level::INFO, "fetch", target = "https://music.example.com/search?q=rain");
    let _enter = span.enter();

    let wrapped = "https://api.allorigins.win/get?url=https%3A%2F%2Fmusic.example.com%2Fsearch%3Fq%3Drain";
    debug!(proxy = "allorigins", url = %elide(wrapped, 48), "Proxy attempt");
    debug!(proxy = "corsproxy", "Proxy attempt");
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

    warn!(round = 1, backoff_ms = 500, "All proxies failed, backing off");
    info!(proxy = "corsproxy", bytes = 48_213, "Fetch succeeded");
}

fn demo_extraction() {
    let span = span!(Level::INFO, "extract");
    let _enter = span.enter();

    trace!(blocks = 14, "Scanning listing blocks");
    debug!(skipped = 2, "Malformed blocks dropped");
    info!(tracks = 12, has_more = true, "Search page extracted");
}

#[instrument(fields(title = "Evening Rain"))]
async fn demo_playback() {
    info!(index = 0, "Track started");

    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    warn!("Direct source failed, resolving the track page");
    info!(
        resolved = "https://music.example.com/files/evening-rain.mp3",
        "Track started"
    );
}
