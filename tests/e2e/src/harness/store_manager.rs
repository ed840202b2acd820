//! Test Store Manager
//!
//! Provides isolated stores for testing:
//! - SQLite databases in temporary directories, removed on drop
//! - A shared manual clock so tests control TTLs, streaks and time of day
//! - Reopening the same database to simulate an app restart

use chrono::Duration;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studymate_core::{
    KeyedStore, ManualClock, ProgressEngine, Role, SqliteSubstrate, StoreConfig,
};
use tempfile::TempDir;

/// Manager for test stores
///
/// # Example
///
/// ```rust,ignore
/// let mut env = TestStoreManager::new_temp("2026-09-01T08:00:00+02:00");
/// env.store.set_large("draft", &"...");
///
/// env.advance(Duration::days(1));
/// env.restart();
/// let mut engine = env.engine(Role::Learner);
/// ```
pub struct TestStoreManager {
    /// The store under test
    pub store: Arc<KeyedStore>,
    /// Clock shared by every store opened through this manager
    pub clock: ManualClock,
    config: StoreConfig,
    /// Kept alive so the directory is not deleted early
    _temp_dir: TempDir,
    db_path: PathBuf,
}

impl TestStoreManager {
    /// Fresh database in a temporary directory, clock at `start` (RFC 3339).
    pub fn new_temp(start: &str) -> Self {
        Self::with_config(start, StoreConfig::default())
    }

    pub fn with_config(start: &str, config: StoreConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_studymate.db");
        let clock = ManualClock::at(start);
        let store = Self::open(&db_path, &clock, &config);

        Self {
            store,
            clock,
            config,
            _temp_dir: temp_dir,
            db_path,
        }
    }

    fn open(path: &Path, clock: &ManualClock, config: &StoreConfig) -> Arc<KeyedStore> {
        let substrate = SqliteSubstrate::open_file(path).expect("Failed to open test database");
        Arc::new(KeyedStore::with_parts(
            Box::new(substrate),
            config.clone(),
            Arc::new(clock.clone()),
        ))
    }

    /// Drop the store and open the same database again (empty cache).
    pub fn restart(&mut self) {
        self.store = Self::open(&self.db_path, &self.clock, &self.config);
    }

    /// Second store over the same database, as another process would see it.
    pub fn second_handle(&self) -> Arc<KeyedStore> {
        Self::open(&self.db_path, &self.clock, &self.config)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Progress engine over this store with the session already started.
    pub fn engine(&self, role: Role) -> ProgressEngine {
        let mut engine = ProgressEngine::open(role, Arc::clone(&self.store));
        engine.start_session();
        engine
    }

    /// Restart, move to the next day and start a session there.
    pub fn next_day(&mut self) -> ProgressEngine {
        self.advance(Duration::days(1));
        self.restart();
        self.engine(Role::Learner)
    }
}
