//! # Progress State
//!
//! The persisted gamification record: XP, streak, per-action counters, daily
//! and weekly activity, special events and unlocked badges.
//!
//! Every field defaults, so a record written by an older build (missing
//! fields, missing nested objects) loads with the gaps filled in.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Feature tag for note creation
pub const FEATURE_NOTES: &str = "notes";
/// Feature tag for quiz generation
pub const FEATURE_QUIZ: &str = "quiz";
/// Feature tag for flashcard decks
pub const FEATURE_FLASHCARDS: &str = "flashcards";
/// Feature tag for the exam simulator
pub const FEATURE_EXAM: &str = "exam";
/// Feature tag for note summaries
pub const FEATURE_SUMMARY: &str = "summary";

/// Every main feature of the app
pub const ALL_FEATURES: &[&str] = &[
    FEATURE_NOTES,
    FEATURE_QUIZ,
    FEATURE_FLASHCARDS,
    FEATURE_EXAM,
    FEATURE_SUMMARY,
];

// ============================================================================
// PARSE ERRORS
// ============================================================================

/// Unknown name passed to a `FromStr` impl in this module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("Unknown action: {0} (expected note, quiz, deck or exam)")]
    UnknownAction(String),
    #[error("Unknown role: {0} (expected learner, owner or judge)")]
    UnknownRole(String),
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Countable learner actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    CreateNote,
    GenerateQuiz,
    CreateFlashcardDeck,
    TakeExam,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::CreateNote,
        ActionKind::GenerateQuiz,
        ActionKind::CreateFlashcardDeck,
        ActionKind::TakeExam,
    ];

    /// Feature tag recorded in the day's stats
    pub fn feature(self) -> &'static str {
        match self {
            ActionKind::CreateNote => FEATURE_NOTES,
            ActionKind::GenerateQuiz => FEATURE_QUIZ,
            ActionKind::CreateFlashcardDeck => FEATURE_FLASHCARDS,
            ActionKind::TakeExam => FEATURE_EXAM,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::CreateNote => "createNote",
            ActionKind::GenerateQuiz => "generateQuiz",
            ActionKind::CreateFlashcardDeck => "createFlashcardDeck",
            ActionKind::TakeExam => "takeExam",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "note" | "notes" | "createnote" => Ok(ActionKind::CreateNote),
            "quiz" | "generatequiz" => Ok(ActionKind::GenerateQuiz),
            "deck" | "flashcards" | "createflashcarddeck" => Ok(ActionKind::CreateFlashcardDeck),
            "exam" | "takeexam" => Ok(ActionKind::TakeExam),
            _ => Err(ParseError::UnknownAction(s.to_string())),
        }
    }
}

/// Lifetime count of each action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionCounts {
    pub create_note: u32,
    pub generate_quiz: u32,
    pub create_flashcard_deck: u32,
    pub take_exam: u32,
}

impl ActionCounts {
    pub fn get(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::CreateNote => self.create_note,
            ActionKind::GenerateQuiz => self.generate_quiz,
            ActionKind::CreateFlashcardDeck => self.create_flashcard_deck,
            ActionKind::TakeExam => self.take_exam,
        }
    }

    pub fn increment(&mut self, kind: ActionKind) {
        let slot = match kind {
            ActionKind::CreateNote => &mut self.create_note,
            ActionKind::GenerateQuiz => &mut self.generate_quiz,
            ActionKind::CreateFlashcardDeck => &mut self.create_flashcard_deck,
            ActionKind::TakeExam => &mut self.take_exam,
        };
        *slot = slot.saturating_add(1);
    }

    /// Set every counter to `n`.
    pub fn uniform(n: u32) -> Self {
        Self {
            create_note: n,
            generate_quiz: n,
            create_flashcard_deck: n,
            take_exam: n,
        }
    }
}

// ============================================================================
// DAILY / WEEKLY STATS
// ============================================================================

/// Activity of one local calendar day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayStats {
    /// Distinct feature tags used
    pub features: Vec<String>,
    /// Local hour of every logged action
    pub time_of_day: Vec<u32>,
    pub quiz_difficulties: Vec<String>,
    pub quiz_topics: Vec<String>,
    pub notes_created: u32,
    pub quizzes_generated: u32,
    pub decks_created: u32,
    pub exams_taken: u32,
    pub summaries_generated: u32,
    pub xp_earned: u64,
}

impl DayStats {
    /// Record a feature tag once.
    pub fn add_feature(&mut self, feature: &str) {
        if !self.has_feature(feature) {
            self.features.push(feature.to_string());
        }
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    pub fn count_action(&mut self, kind: ActionKind) {
        let slot = match kind {
            ActionKind::CreateNote => &mut self.notes_created,
            ActionKind::GenerateQuiz => &mut self.quizzes_generated,
            ActionKind::CreateFlashcardDeck => &mut self.decks_created,
            ActionKind::TakeExam => &mut self.exams_taken,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Activity of one ISO week
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeekStats {
    pub xp_earned: u64,
    pub days_active: u32,
}

/// ISO week key, e.g. `2026-W07`
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

// ============================================================================
// SPECIAL EVENTS
// ============================================================================

/// Flags and maxima behind the secret badges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecialEvents {
    pub konami_code_used: bool,
    /// Inputs in the current rapid-input burst
    pub button_mash_count: u32,
    /// Epoch ms of the last rapid input
    pub button_mash_timestamp: i64,
    /// Minutes
    pub longest_session: u32,
    /// Minutes
    pub longest_exam_session: u32,
    /// Bytes
    pub largest_file_uploaded: u64,
    /// Consecutive quizzes generated on hard difficulty
    pub hard_quiz_run: u32,
    pub clock_skew_detected: bool,
    pub page_not_found_visited: bool,
    pub hidden_feature_found: bool,
}

/// A streak that ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRun {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length: u32,
}

// ============================================================================
// PROGRESS STATE
// ============================================================================

/// One learner's accumulated progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    pub xp: u64,
    /// Consecutive days with a session
    pub streak: u32,
    pub last_login: Option<NaiveDate>,
    /// Unlocked badge ids in unlock order
    pub badges: Vec<String>,
    pub actions: ActionCounts,
    pub daily_stats: BTreeMap<NaiveDate, DayStats>,
    /// Keyed by [`iso_week_key`]
    pub weekly_stats: BTreeMap<String, WeekStats>,
    pub special_events: SpecialEvents,
    pub first_use: Option<NaiveDate>,
    pub total_days_used: u32,
    pub streak_history: Vec<StreakRun>,
    /// Distinct topics, first-seen order
    pub note_topics: Vec<String>,
    pub total_words_written: u64,
    pub perfect_scores: u32,
}

impl ProgressState {
    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.iter().any(|b| b == id)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayStats> {
        self.daily_stats.get(&date)
    }

    /// Stats for `date`, created empty if missing.
    pub fn day_mut(&mut self, date: NaiveDate) -> &mut DayStats {
        self.daily_stats.entry(date).or_default()
    }

    /// Stats for the ISO week containing `date`, created empty if missing.
    pub fn week_mut(&mut self, date: NaiveDate) -> &mut WeekStats {
        self.weekly_stats.entry(iso_week_key(date)).or_default()
    }

    /// Add a topic unless already known.
    pub fn add_topic(&mut self, topic: &str) {
        if !self.note_topics.iter().any(|t| t == topic) {
            self.note_topics.push(topic.to_string());
        }
    }
}
