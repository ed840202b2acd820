//! Progress persistence strategies
//!
//! A learner's progress lives in the keyed store; the demo identities get a
//! constant state that ignores every mutation.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::catalog::catalog;
use super::state::{ActionCounts, ParseError, ProgressState, SpecialEvents, StreakRun};
use crate::storage::{KeyedStore, StoreOptions};

/// Keyed-store key of the persisted progress
pub const PROGRESS_KEY: &str = "gamification_progress";

/// Badges shown unlocked for the judge identity
pub const JUDGE_BADGES: &[&str] = &[
    "first-note",
    "first-quiz",
    "first-deck",
    "level-2",
    "level-5",
    "streak-3",
    "streak-7",
];

/// Where progress comes from and whether it can change
pub trait ProgressStore: Send {
    fn state(&self) -> &ProgressState;

    /// Apply `mutation`. Returns `false` if this store ignores mutations.
    fn update(&mut self, mutation: &mut dyn FnMut(&mut ProgressState)) -> bool;
}

// ============================================================================
// PERSISTENT
// ============================================================================

/// Progress loaded from and written back to a [`KeyedStore`].
pub struct PersistentProgressStore {
    store: Arc<KeyedStore>,
    state: ProgressState,
}

impl PersistentProgressStore {
    /// Load saved progress, default-filling missing fields. Unreadable or
    /// absent progress starts fresh.
    pub fn load(store: Arc<KeyedStore>) -> Self {
        let state = store.get(PROGRESS_KEY).unwrap_or_default();
        Self { store, state }
    }
}

impl ProgressStore for PersistentProgressStore {
    fn state(&self) -> &ProgressState {
        &self.state
    }

    fn update(&mut self, mutation: &mut dyn FnMut(&mut ProgressState)) -> bool {
        let before = self.state.clone();
        mutation(&mut self.state);

        // in-memory state stays authoritative even if the write fails
        if self.state != before && !self.store.set(PROGRESS_KEY, &self.state, &StoreOptions::default()) {
            tracing::warn!("Failed to save gamification progress");
        }
        true
    }
}

// ============================================================================
// FIXED DEMO
// ============================================================================

/// Constant, pre-populated progress for demonstration identities.
#[derive(Debug, Clone)]
pub struct FixedDemoProgressStore {
    state: ProgressState,
}

impl FixedDemoProgressStore {
    /// Maximum progress with every badge unlocked.
    pub fn owner(today: NaiveDate) -> Self {
        let first_use = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(today);
        let state = ProgressState {
            xp: 10_000,
            streak: 365,
            last_login: Some(today),
            badges: catalog().iter().map(|b| b.id.to_string()).collect(),
            actions: ActionCounts::uniform(100),
            special_events: SpecialEvents {
                konami_code_used: true,
                button_mash_count: 100,
                longest_session: 720,
                largest_file_uploaded: 100 * 1024 * 1024,
                ..SpecialEvents::default()
            },
            first_use: Some(first_use),
            total_days_used: 365,
            streak_history: vec![StreakRun {
                start: first_use,
                end: today,
                length: 365,
            }],
            note_topics: [
                "Math",
                "Science",
                "History",
                "Literature",
                "Programming",
                "AI",
                "Machine Learning",
                "Physics",
                "Chemistry",
                "Biology",
            ]
            .map(String::from)
            .to_vec(),
            total_words_written: 1_000_000,
            perfect_scores: 100,
            ..ProgressState::default()
        };
        Self { state }
    }

    /// Modest progress with a handful of starter badges.
    pub fn judge(today: NaiveDate) -> Self {
        let first_use = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(today);
        let state = ProgressState {
            xp: 750,
            streak: 10,
            last_login: Some(today),
            badges: JUDGE_BADGES.iter().map(|id| id.to_string()).collect(),
            actions: ActionCounts {
                create_note: 2,
                generate_quiz: 3,
                create_flashcard_deck: 1,
                take_exam: 1,
            },
            special_events: SpecialEvents {
                button_mash_count: 5,
                longest_session: 120,
                largest_file_uploaded: 2 * 1024 * 1024,
                ..SpecialEvents::default()
            },
            first_use: Some(first_use),
            total_days_used: 10,
            streak_history: vec![StreakRun {
                start: first_use,
                end: today,
                length: 10,
            }],
            note_topics: vec!["Test".to_string(), "Demo".to_string()],
            total_words_written: 1000,
            perfect_scores: 1,
            ..ProgressState::default()
        };
        Self { state }
    }
}

impl ProgressStore for FixedDemoProgressStore {
    fn state(&self) -> &ProgressState {
        &self.state
    }

    fn update(&mut self, _mutation: &mut dyn FnMut(&mut ProgressState)) -> bool {
        false
    }
}

// ============================================================================
// ROLE
// ============================================================================

/// Identity the app runs as, resolved once at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Learner,
    Owner,
    Judge,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Learner => "learner",
            Role::Owner => "owner",
            Role::Judge => "judge",
        })
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "learner" => Ok(Role::Learner),
            "owner" => Ok(Role::Owner),
            "judge" => Ok(Role::Judge),
            _ => Err(ParseError::UnknownRole(s.to_string())),
        }
    }
}

/// Pick the progress strategy for `role`.
pub fn open_progress_store(role: Role, store: Arc<KeyedStore>) -> Box<dyn ProgressStore> {
    let today = store.clock().today();
    match role {
        Role::Learner => Box::new(PersistentProgressStore::load(store)),
        Role::Owner => Box::new(FixedDemoProgressStore::owner(today)),
        Role::Judge => Box::new(FixedDemoProgressStore::judge(today)),
    }
}
