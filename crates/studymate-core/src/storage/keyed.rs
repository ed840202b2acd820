//! Keyed record store
//!
//! Typed get/set over a [`Substrate`] with TTL expiry, optional compression
//! and obfuscation, and a short-lived read cache.
//!
//! The public operations never return errors: failures are logged with
//! `tracing::warn!` and surface as `false`, `None` or the caller's default.
//! A single writer per key is assumed; the cache is not invalidated by
//! changes made to the substrate behind the store's back.

use chrono::Duration;
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::record::{StoreOptions, StoredRecord};
use super::substrate::{MemorySubstrate, Result, Substrate};
use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;

/// Format tag of [`KeyedStore::export_all`] snapshots
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

// ============================================================================
// SUPPORTING TYPES
// ============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    cached_at: i64,
    expires_at: Option<i64>,
}

/// Storage usage summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Sum of UTF-8 bytes of every key and value
    pub total_size: usize,
    /// Number of keys in the substrate
    pub item_count: usize,
    /// Key and size of the biggest entry
    pub largest_item: Option<(String, usize)>,
    /// Fraction of `get` calls answered from the cache
    pub cache_hit_rate: f64,
}

/// Outcome of [`KeyedStore::cleanup`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Keys inspected
    pub scanned: usize,
    /// Records removed because their TTL elapsed
    pub expired: usize,
    /// Values removed because they could not be decoded
    pub corrupt: usize,
}

/// Backup snapshot of every raw stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    /// Snapshot format tag
    #[serde(default)]
    pub version: Option<String>,
    /// Export time, epoch milliseconds
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Key to raw stored text (already transformed)
    pub data: BTreeMap<String, Option<String>>,
}

/// Rewrites the data of records tagged with an old schema version.
#[derive(Debug, Clone, Copy)]
pub struct RecordMigration {
    /// Records with this schema tag are migrated
    pub from_version: &'static str,
    /// Tag written after the transform
    pub to_version: &'static str,
    /// Data transform
    pub transform: fn(Value) -> Value,
}

// ============================================================================
// KEYED STORE
// ============================================================================

/// Typed key/value store with TTL, transforms and a read cache.
///
/// All methods take `&self`, so a store can be shared through an `Arc`.
pub struct KeyedStore {
    substrate: Box<dyn Substrate>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    cache: Mutex<LruCache<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl KeyedStore {
    /// Store over `substrate` with default config and the system clock.
    pub fn new(substrate: Box<dyn Substrate>) -> Self {
        Self::with_parts(substrate, StoreConfig::default(), Arc::new(SystemClock))
    }

    /// Store with explicit config and clock.
    pub fn with_parts(
        substrate: Box<dyn Substrate>,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            substrate,
            clock,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Volatile store, mostly for tests.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySubstrate::new()))
    }

    /// Clock used for timestamps and expiry.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    // ------------------------------------------------------------------------
    // cache
    // ------------------------------------------------------------------------

    fn cache_lookup(&self, key: &str, now: i64) -> Option<Value> {
        let mut cache = self.cache.lock().ok()?;
        let entry = cache.get(key)?;

        let fresh = now - entry.cached_at < self.config.cache_freshness.num_milliseconds();
        let alive = entry.expires_at.is_none_or(|deadline| now <= deadline);

        if fresh && alive {
            Some(entry.value.clone())
        } else {
            cache.pop(key);
            None
        }
    }

    fn cache_put(&self, key: &str, value: Value, now: i64, expires_at: Option<i64>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key.to_string(),
                CacheEntry {
                    value,
                    cached_at: now,
                    expires_at,
                },
            );
        }
    }

    fn cache_evict(&self, key: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(key);
        }
    }

    fn cache_clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    // ------------------------------------------------------------------------
    // write path
    // ------------------------------------------------------------------------

    fn write_record(&self, key: &str, record: StoredRecord, compress: bool) -> Result<()> {
        let encrypt = record.encrypted;
        let (text, record) = record.encode(compress, encrypt, self.config.compression_threshold)?;
        self.substrate.write(key, &text)?;
        self.cache_put(
            key,
            record.data.clone(),
            self.clock.now_millis(),
            record.expires_at(),
        );
        Ok(())
    }

    fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: &StoreOptions,
    ) -> Result<()> {
        let data = serde_json::to_value(value)?;
        let record = StoredRecord::new(data, self.clock.now_millis(), options);
        self.write_record(key, record, options.compress)
    }

    /// Write `value` under `key`. Returns `false` (and logs) on failure.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, options: &StoreOptions) -> bool {
        match self.try_set(key, value, options) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to store item");
                false
            }
        }
    }

    /// Write with compression enabled.
    pub fn set_large<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.set(key, value, &StoreOptions::default().compressed())
    }

    /// Write a record that expires after `ttl`.
    pub fn set_temporary<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        self.set(key, value, &StoreOptions::default().with_ttl(ttl))
    }

    /// Write compressed and obfuscated. Obfuscation only defeats casual inspection.
    pub fn set_secure<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.set(key, value, &StoreOptions::default().compressed().encrypted())
    }

    // ------------------------------------------------------------------------
    // read path
    // ------------------------------------------------------------------------

    /// Decode the record under `key`, deleting it if expired.
    fn load_record(&self, key: &str, now: i64) -> Result<Option<StoredRecord>> {
        let Some(raw) = self.substrate.read(key)? else {
            return Ok(None);
        };

        let record = StoredRecord::decode(&raw)?;
        if record.is_expired(now) {
            debug!(key, "Record expired, removing");
            self.remove(key);
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Read the value under `key`.
    ///
    /// Returns `None` when the key is missing, expired, undecodable, or holds
    /// a value of another type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = self.clock.now_millis();

        let value = match self.cache_lookup(key, now) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                value
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                match self.load_record(key, now) {
                    Ok(Some(record)) => {
                        self.cache_put(key, record.data.clone(), now, record.expires_at());
                        record.data
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        warn!(key, error = %e, "Failed to read item");
                        return None;
                    }
                }
            }
        };

        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key, error = %e, "Stored item has an unexpected shape");
                None
            }
        }
    }

    /// Read the value under `key`, or `default` if there is none.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Raw stored text, exactly as written to the substrate.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.substrate.read(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to read raw item");
            None
        })
    }

    /// Every key in the substrate.
    pub fn keys(&self) -> Vec<String> {
        self.substrate.keys().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to enumerate keys");
            Vec::new()
        })
    }

    // ------------------------------------------------------------------------
    // deletion
    // ------------------------------------------------------------------------

    /// Delete `key` and its cache entry.
    pub fn remove(&self, key: &str) -> bool {
        self.cache_evict(key);
        match self.substrate.delete(key) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to remove item");
                false
            }
        }
    }

    /// Delete every key and empty the cache.
    pub fn clear(&self) -> bool {
        self.cache_clear();
        match self.substrate.clear() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to clear storage");
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // backup / restore
    // ------------------------------------------------------------------------

    /// Snapshot every raw stored value as JSON.
    pub fn export_all(&self) -> String {
        let mut data = BTreeMap::new();
        for key in self.keys() {
            let raw = self.raw(&key);
            data.insert(key, raw);
        }

        let snapshot = ExportSnapshot {
            version: Some(EXPORT_FORMAT_VERSION.to_string()),
            timestamp: Some(self.clock.now_millis()),
            data,
        };

        serde_json::to_string(&snapshot).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize export snapshot");
            String::new()
        })
    }

    /// Replace all stored values with a snapshot from [`export_all`](Self::export_all).
    ///
    /// The snapshot is validated before anything is touched; an invalid
    /// snapshot returns `false` and leaves the store as it was.
    pub fn import_all(&self, backup: &str) -> bool {
        let snapshot: ExportSnapshot = match serde_json::from_str(backup) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Rejected invalid backup");
                return false;
            }
        };

        if !self.clear() {
            return false;
        }

        let mut failed = 0usize;
        for (key, value) in &snapshot.data {
            let Some(value) = value else { continue };
            if let Err(e) = self.substrate.write(key, value) {
                warn!(key, error = %e, "Failed to restore item");
                failed += 1;
            }
        }

        info!(
            restored = snapshot.data.len() - failed,
            failed, "Backup imported"
        );
        failed == 0
    }

    // ------------------------------------------------------------------------
    // maintenance
    // ------------------------------------------------------------------------

    /// Remove expired records and values that no longer decode.
    pub fn cleanup(&self) -> CleanupReport {
        let now = self.clock.now_millis();
        let mut report = CleanupReport::default();

        for key in self.keys() {
            report.scanned += 1;

            let raw = match self.substrate.read(&key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key, error = %e, "Skipping unreadable item during cleanup");
                    continue;
                }
            };

            match StoredRecord::decode(&raw) {
                Ok(record) if record.is_expired(now) => {
                    self.remove(&key);
                    report.expired += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(key, error = %e, "Removing undecodable item");
                    self.remove(&key);
                    report.corrupt += 1;
                }
            }
        }

        if report.expired + report.corrupt > 0 {
            info!(
                scanned = report.scanned,
                expired = report.expired,
                corrupt = report.corrupt,
                "Storage cleanup complete"
            );
        }
        report
    }

    /// Bring records tagged with old schema versions up to date.
    ///
    /// Migrations chain: a record at `1.0.0` with migrations `1.0.0 -> 1.1.0`
    /// and `1.1.0 -> 2.0.0` ends at `2.0.0`. Transforms and TTL are kept, and
    /// so is the original write time. Returns the number of rewritten records.
    pub fn migrate(&self, migrations: &[RecordMigration]) -> usize {
        let now = self.clock.now_millis();
        let mut migrated = 0;

        for key in self.keys() {
            let mut record = match self.load_record(&key, now) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    debug!(key, error = %e, "Skipping undecodable item during migration");
                    continue;
                }
            };

            let mut changed = false;
            for _ in 0..migrations.len() {
                let Some(step) = migrations.iter().find(|m| m.from_version == record.version) else {
                    break;
                };
                record.data = (step.transform)(record.data);
                record.version = step.to_version.to_string();
                changed = true;
            }

            if !changed {
                continue;
            }

            let compress = record.compressed;
            match self.write_record(&key, record, compress) {
                Ok(()) => migrated += 1,
                Err(e) => warn!(key, error = %e, "Failed to write migrated item"),
            }
        }

        migrated
    }

    /// Storage usage and cache effectiveness.
    pub fn stats(&self) -> StoreStats {
        let mut total_size = 0;
        let mut item_count = 0;
        let mut largest_item: Option<(String, usize)> = None;

        for key in self.keys() {
            let size = match self.substrate.byte_size(&key) {
                Ok(size) => size,
                Err(e) => {
                    warn!(key, error = %e, "Failed to size item");
                    continue;
                }
            };
            total_size += size;
            item_count += 1;
            if largest_item.as_ref().is_none_or(|(_, biggest)| size > *biggest) {
                largest_item = Some((key, size));
            }
        }

        let hits = self.hits.load(Ordering::Relaxed);
        let lookups = hits + self.misses.load(Ordering::Relaxed);
        let cache_hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        StoreStats {
            total_size,
            item_count,
            largest_item,
            cache_hit_rate,
        }
    }
}

impl std::fmt::Debug for KeyedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
