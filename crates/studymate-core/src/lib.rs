//! # StudyMate Core
//!
//! Local persistence and gamification for a study assistant.
//!
//! - **KeyedStore**: typed key/value records with TTL expiry, run-length
//!   compression, casual-inspection obfuscation, a short-lived read cache,
//!   backup/restore, cleanup and schema migrations
//! - **Substrates**: in-memory (with quota and availability switches) and
//!   SQLite on disk
//! - **ProgressEngine**: XP, levels, streaks, daily and weekly stats, and a
//!   78-badge catalog evaluated after every change
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use studymate_core::{
//!     ActionContext, ActionKind, KeyedStore, ProgressEngine, Role, SqliteSubstrate, StoreConfig,
//!     SystemClock,
//! };
//!
//! # fn main() -> studymate_core::Result<()> {
//! let substrate = SqliteSubstrate::open(None)?;
//! let store = Arc::new(KeyedStore::with_parts(
//!     Box::new(substrate),
//!     StoreConfig::from_env(),
//!     Arc::new(SystemClock),
//! ));
//!
//! store.set_secure("apiKey", "sk-example");
//!
//! let mut engine = ProgressEngine::open(Role::Learner, Arc::clone(&store));
//! engine.start_session();
//! engine.log_action(ActionKind::CreateNote, &ActionContext::default().with_topic("Cells"));
//! engine.add_experience(10);
//!
//! for note in engine.drain_notifications() {
//!     println!("{}: {}", note.title, note.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): compile SQLite into the crate

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clock;
pub mod config;
pub mod progress;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;

// Storage layer
pub use storage::{
    CleanupReport, DebouncedWriter, ExportSnapshot, KeyedStore, MemorySubstrate, RecordMigration,
    Result, SqliteSubstrate, StoreError, StoreOptions, StoreStats, StoredRecord, Substrate,
};

// Progress and badges
pub use progress::{
    ActionContext, ActionKind, BadgeDefinition, BadgeRule, BadgeView, LevelDetails, Notification,
    NotificationKind, ProgressEngine, ProgressState, ProgressStore, Role, SpecialEvent,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ActionContext, ActionKind, Clock, KeyedStore, MemorySubstrate, ProgressEngine, Role,
        SqliteSubstrate, StoreConfig, StoreOptions, Substrate, SystemClock,
    };
}
