//! Storage Module
//!
//! Keyed record store over a pluggable substrate:
//! - In-memory and SQLite substrates
//! - Per-record TTL and schema tags
//! - Run-length compression and base64 obfuscation layers
//! - Short-lived read cache, backup/restore, cleanup and record migrations

mod codec;
mod debounce;
mod keyed;
mod migrations;
mod record;
mod sqlite;
mod substrate;

pub use codec::{deobfuscate, obfuscate, rle_compress, rle_decompress};
pub use debounce::{DEFAULT_QUIET_PERIOD_MS, DebouncedWriter};
pub use keyed::{
    CleanupReport, EXPORT_FORMAT_VERSION, ExportSnapshot, KeyedStore, RecordMigration, StoreStats,
};
pub use migrations::MIGRATIONS;
pub use record::{
    COMPRESSED_PREFIX, DEFAULT_SCHEMA_VERSION, OBFUSCATED_PREFIX, StoreOptions, StoredRecord,
};
pub use sqlite::{DB_FILE_NAME, SqliteSubstrate};
pub use substrate::{MemorySubstrate, Result, StoreError, Substrate};
