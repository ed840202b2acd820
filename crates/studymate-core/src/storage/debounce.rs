//! Debounced writes
//!
//! Collapses bursts of saves (for example, a note being typed) into a single
//! write once the value has been quiet for a while. There is no background
//! timer: callers [`poll`](DebouncedWriter::poll) from their own loop, and any
//! pending value is flushed on drop.

use chrono::Duration;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use super::keyed::KeyedStore;

/// Default quiet period before a pending value is written
pub const DEFAULT_QUIET_PERIOD_MS: i64 = 1_000;

struct Pending<T> {
    value: T,
    pushed_at: i64,
}

/// Writes the latest pushed value under one key after a quiet period.
pub struct DebouncedWriter<T: Serialize> {
    store: Arc<KeyedStore>,
    key: String,
    quiet_period: Duration,
    pending: Mutex<Option<Pending<T>>>,
}

impl<T: Serialize> DebouncedWriter<T> {
    pub fn new(store: Arc<KeyedStore>, key: impl Into<String>) -> Self {
        Self::with_quiet_period(store, key, Duration::milliseconds(DEFAULT_QUIET_PERIOD_MS))
    }

    pub fn with_quiet_period(
        store: Arc<KeyedStore>,
        key: impl Into<String>,
        quiet_period: Duration,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            quiet_period,
            pending: Mutex::new(None),
        }
    }

    /// Replace the pending value and restart the quiet period.
    pub fn push(&self, value: T) {
        let pushed_at = self.store.clock().now_millis();
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(Pending { value, pushed_at });
        }
    }

    /// Whether a value is waiting to be written.
    pub fn is_pending(&self) -> bool {
        self.pending.lock().map(|p| p.is_some()).unwrap_or(false)
    }

    /// Write the pending value if the quiet period has elapsed.
    ///
    /// Returns `true` when a write happened and succeeded.
    pub fn poll(&self) -> bool {
        let now = self.store.clock().now_millis();
        let due = self
            .pending
            .lock()
            .map(|p| {
                p.as_ref()
                    .is_some_and(|p| now - p.pushed_at >= self.quiet_period.num_milliseconds())
            })
            .unwrap_or(false);

        due && self.flush()
    }

    /// Write the pending value now. Returns `false` if nothing was pending or
    /// the write failed; a failed value stays pending.
    pub fn flush(&self) -> bool {
        let taken = match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(_) => None,
        };

        let Some(pending) = taken else {
            return false;
        };

        if self.store.set_large(&self.key, &pending.value) {
            return true;
        }

        // a push made during the write wins over the failed value
        if let Ok(mut slot) = self.pending.lock() {
            if slot.is_none() {
                *slot = Some(pending);
            }
        }
        false
    }
}

impl<T: Serialize> Drop for DebouncedWriter<T> {
    fn drop(&mut self) {
        if self.is_pending() {
            tracing::debug!(key = %self.key, "Flushing pending write on drop");
            self.flush();
        }
    }
}
