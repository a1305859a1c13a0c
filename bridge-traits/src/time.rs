//! Time Abstraction
//!
//! Provides an injectable time source so cache freshness checks and stored
//! timestamps are deterministic under test.

use chrono::{DateTime, Utc};

/// Time source trait
///
/// Abstracts system time to enable deterministic testing of TTL logic and
/// stored timestamps.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn cache_key_age(clock: &dyn Clock, stored_at: i64) -> i64 {
///     clock.unix_timestamp_millis() - stored_at
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in seconds
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }

    /// Get current Unix timestamp in milliseconds
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
