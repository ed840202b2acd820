//! Wall-clock abstraction
//!
//! Everything time-dependent in the core (TTL expiry, cache freshness, the
//! debounce quiet period, streak rollover, time-of-day badges) reads time
//! through [`Clock`] so tests can drive it with [`ManualClock`].

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate};
use std::sync::{Arc, RwLock};

/// Source of the current local date and time.
pub trait Clock: Send + Sync {
    /// Current instant, carrying the user's local UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// Local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Manually driven clock for tests and simulations.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// pass another into the store or engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<RwLock<DateTime<FixedOffset>>>,
}

impl ManualClock {
    /// Start the clock at a fixed instant.
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            current: Arc::new(RwLock::new(start)),
        }
    }

    /// Start the clock at an RFC 3339 timestamp, e.g. `2026-03-14T09:30:00+00:00`.
    ///
    /// Falls back to the Unix epoch when the string does not parse.
    pub fn at(rfc3339: &str) -> Self {
        let start = DateTime::parse_from_rfc3339(rfc3339).unwrap_or_default();
        Self::new(start)
    }

    /// Move time forward (or backward with a negative duration).
    pub fn advance(&self, by: Duration) {
        if let Ok(mut current) = self.current.write() {
            *current += by;
        }
    }

    /// Jump to an exact instant.
    pub fn set(&self, to: DateTime<FixedOffset>) {
        if let Ok(mut current) = self.current.write() {
            *current = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.current
            .read()
            .map(|current| *current)
            .unwrap_or_default()
    }
}
