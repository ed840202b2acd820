//! Host key/value substrate
//!
//! The durable layer underneath [`KeyedStore`](super::KeyedStore). It only
//! knows about opaque strings; record framing, transforms and expiry live in
//! the store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Store error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error from the SQLite substrate
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A write would exceed the substrate's capacity
    #[error("Quota exceeded: writing {requested} bytes with {used}/{quota} in use")]
    QuotaExceeded {
        /// Bytes the write needed
        requested: usize,
        /// Bytes already in use by other keys
        used: usize,
        /// Capacity of the substrate
        quota: usize,
    },
    /// Storage is disabled or unreachable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A stored value could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Store result type
pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// SUBSTRATE TRAIT
// ============================================================================

/// A persistent string-to-string map provided by the host.
///
/// Implementations report failures; they never panic. Only one writer per key
/// is assumed: nothing here coordinates concurrent writers across processes.
pub trait Substrate: Send + Sync {
    /// Read the raw string stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Every key currently stored.
    fn keys(&self) -> Result<Vec<String>>;

    /// Delete every key.
    fn clear(&self) -> Result<()>;

    /// UTF-8 byte length of key plus value, 0 when the key is absent.
    fn byte_size(&self, key: &str) -> Result<usize> {
        Ok(self
            .read(key)?
            .map(|value| key.len() + value.len())
            .unwrap_or(0))
    }
}

/// A shared substrate, so a caller can keep a handle to the one a store uses.
impl<S: Substrate + ?Sized> Substrate for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn byte_size(&self, key: &str) -> Result<usize> {
        (**self).byte_size(key)
    }
}

// ============================================================================
// IN-MEMORY SUBSTRATE
// ============================================================================

#[derive(Debug, Default)]
struct MemoryInner {
    items: BTreeMap<String, String>,
    available: bool,
}

/// Volatile substrate with an optional byte quota.
///
/// Behaves like a quota-limited host key/value store so the store's failure
/// handling can be exercised: writes past the quota fail, and the whole substrate can
/// be switched off to simulate disabled storage.
#[derive(Debug)]
pub struct MemorySubstrate {
    inner: Mutex<MemoryInner>,
    quota: Option<usize>,
}

impl Default for MemorySubstrate {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySubstrate {
    /// Unbounded substrate.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                items: BTreeMap::new(),
                available: true,
            }),
            quota: None,
        }
    }

    /// Substrate that rejects writes once key + value bytes exceed `quota`.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    /// Toggle availability; while unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.available = available;
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory substrate lock poisoned".to_string()))?;
        if !inner.available {
            return Err(StoreError::Unavailable("storage is disabled".to_string()));
        }
        Ok(inner)
    }
}

impl Substrate for MemorySubstrate {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.items.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock()?;

        if let Some(quota) = self.quota {
            let used: usize = inner
                .items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let requested = key.len() + value.len();
            if used + requested > quota {
                return Err(StoreError::QuotaExceeded {
                    requested,
                    used,
                    quota,
                });
            }
        }

        inner.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.items.keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.items.clear();
        Ok(())
    }
}
