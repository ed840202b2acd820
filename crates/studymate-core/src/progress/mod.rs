//! Progress Module
//!
//! Gamification over the keyed store:
//! - XP and levels (100 XP per level)
//! - Daily streaks reconciled once per session
//! - Daily, weekly and special-event stats
//! - A fixed badge catalog evaluated after every change
//! - Constant demo progress for the owner and judge identities

mod badges;
mod catalog;
mod engine;
mod state;
mod store;

pub use badges::{
    BadgeDefinition, BadgeRule, CalendarCondition, CompositeCondition, EvalContext,
    RAPID_INPUT_WINDOW_MS, evaluate_badges,
};
pub use catalog::{catalog, find_badge};
pub use engine::{
    ActionContext, BadgeView, LevelDetails, NOTIFICATION_STAGGER, Notification, NotificationKind,
    ProgressEngine, SpecialEvent, XP_PER_LEVEL,
};
pub use state::{
    ALL_FEATURES, ActionCounts, ActionKind, DayStats, FEATURE_EXAM, FEATURE_FLASHCARDS,
    FEATURE_NOTES, FEATURE_QUIZ, FEATURE_SUMMARY, ParseError, ProgressState, SpecialEvents,
    StreakRun, WeekStats, iso_week_key,
};
pub use store::{
    FixedDemoProgressStore, JUDGE_BADGES, PROGRESS_KEY, PersistentProgressStore, ProgressStore,
    Role, open_progress_store,
};
