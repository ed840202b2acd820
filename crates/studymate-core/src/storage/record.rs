//! Stored record framing
//!
//! A record is the caller's value wrapped with its write time, schema tag,
//! optional TTL and the transforms applied to it. The serialized JSON is then
//! optionally compressed and optionally obfuscated; each layer is marked with
//! a prefix so reads peel exactly what writes applied.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::codec;
use super::substrate::{Result, StoreError};

/// Schema tag written when the caller does not supply one
pub const DEFAULT_SCHEMA_VERSION: &str = "1.0.0";

/// Prefix of a run-length compressed layer
pub const COMPRESSED_PREFIX: &str = "~rle:";

/// Prefix of an obfuscated layer
pub const OBFUSCATED_PREFIX: &str = "~b64r:";

/// Per-write options for [`KeyedStore::set`](super::KeyedStore::set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Run-length compress large records.
    pub compress: bool,
    /// Record expires this long after it was written.
    pub ttl: Option<Duration>,
    /// Caller-defined schema tag used by [`KeyedStore::migrate`](super::KeyedStore::migrate).
    pub version: String,
    /// Obfuscate the stored text (reverse + base64). Not encryption.
    pub encrypt: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            compress: false,
            ttl: None,
            version: DEFAULT_SCHEMA_VERSION.to_string(),
            encrypt: false,
        }
    }
}

impl StoreOptions {
    /// Enable compression.
    pub fn compressed(mut self) -> Self {
        self.compress = true;
        self
    }

    /// Enable obfuscation.
    pub fn encrypted(mut self) -> Self {
        self.encrypt = true;
        self
    }

    /// Expire the record after `ttl`.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Tag the record with a schema version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// The JSON envelope written for every key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Caller's value
    pub data: Value,
    /// Write time, epoch milliseconds
    pub timestamp: i64,
    /// Schema tag
    pub version: String,
    /// Time to live in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    /// Whether the stored text was run-length compressed
    #[serde(default)]
    pub compressed: bool,
    /// Whether the stored text was obfuscated
    #[serde(default)]
    pub encrypted: bool,
}

impl StoredRecord {
    /// Wrap `data` written at `now_ms`.
    pub fn new(data: Value, now_ms: i64, options: &StoreOptions) -> Self {
        Self {
            data,
            timestamp: now_ms,
            version: options.version.clone(),
            ttl: options.ttl.map(|ttl| ttl.num_milliseconds()),
            compressed: false,
            encrypted: options.encrypt,
        }
    }

    /// Epoch milliseconds after which the record is expired.
    pub fn expires_at(&self) -> Option<i64> {
        self.ttl.map(|ttl| self.timestamp.saturating_add(ttl))
    }

    /// `now - timestamp > ttl`
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at().is_some_and(|deadline| now_ms > deadline)
    }

    /// Serialize and apply transforms.
    ///
    /// Compression only runs when the JSON is larger than
    /// `compression_threshold`, and is dropped again if it would not make the
    /// stored text shorter. The returned record's flags say what was applied.
    pub fn encode(
        mut self,
        compress: bool,
        encrypt: bool,
        compression_threshold: usize,
    ) -> Result<(String, StoredRecord)> {
        self.compressed = false;
        self.encrypted = encrypt;

        let mut text = serde_json::to_string(&self)?;

        if compress && text.len() > compression_threshold {
            self.compressed = true;
            let flagged = serde_json::to_string(&self)?;
            let packed = format!("{COMPRESSED_PREFIX}{}", codec::rle_compress(&flagged));
            if packed.len() < text.len() {
                text = packed;
            } else {
                tracing::debug!(
                    raw = text.len(),
                    packed = packed.len(),
                    "Compression would grow record, storing uncompressed"
                );
                self.compressed = false;
            }
        }

        if encrypt {
            text = format!("{OBFUSCATED_PREFIX}{}", codec::obfuscate(&text));
        }

        Ok((text, self))
    }

    /// Peel transforms and parse. Flags must agree with the layers found.
    pub fn decode(raw: &str) -> Result<StoredRecord> {
        let mut text = raw.to_string();
        let mut was_obfuscated = false;
        let mut was_compressed = false;

        if let Some(body) = text.strip_prefix(OBFUSCATED_PREFIX) {
            text = codec::deobfuscate(body)?;
            was_obfuscated = true;
        }

        if let Some(body) = text.strip_prefix(COMPRESSED_PREFIX) {
            text = codec::rle_decompress(body)?;
            was_compressed = true;
        }

        let record: StoredRecord = serde_json::from_str(&text)?;

        if record.encrypted != was_obfuscated || record.compressed != was_compressed {
            return Err(StoreError::Corrupt(format!(
                "transform flags (compressed={}, encrypted={}) do not match stored layers",
                record.compressed, record.encrypted
            )));
        }

        Ok(record)
    }
}
