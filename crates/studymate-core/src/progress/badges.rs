//! # Badge Rules
//!
//! Every badge carries a [`BadgeRule`]: a small closed language of predicates
//! over [`ProgressState`] and the local wall-clock time. Evaluation is a pure
//! function of those two inputs.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike, Weekday};
use std::collections::HashSet;

use super::catalog::catalog;
use super::state::{ALL_FEATURES, ActionKind, DayStats, ProgressState};

/// Days covered by the weekly XP and single-feature-week predicates
const WEEK_DAYS: i64 = 7;

/// Shortest streak that counts as revived after a break
const REVIVED_STREAK_MIN: u32 = 3;

/// Rapid inputs count as a burst within this window (milliseconds)
pub const RAPID_INPUT_WINDOW_MS: i64 = 10_000;

// ============================================================================
// RULES
// ============================================================================

/// Predicates on the local clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarCondition {
    /// Inclusive hour range; wraps past midnight when `from > to`
    HourWindow { from: u32, to: u32 },
    /// Saturday or Sunday
    Weekend,
    Weekday(Weekday),
    DayOfYear { month: u32, day: u32 },
    /// At least this many days since first use
    DaysSinceFirstUse(i64),
}

/// Predicates over accumulated stats. Thresholds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeCondition {
    DistinctFeaturesToday(usize),
    RequiredFeaturesToday(&'static [&'static str]),
    DecksToday(u32),
    /// Quizzes plus decks generated today
    ItemsToday(u32),
    /// XP earned over the last seven days, today included
    WeeklyXp(u64),
    /// XP reached while still on the first day of use
    FirstDayXp(u64),
    TotalDaysUsed(u32),
    PerfectScores(u32),
    /// Bytes
    LargestFile(u64),
    WordsWritten(u64),
    DistinctTopics(usize),
    HardQuizToday,
    HardQuizRun(u32),
    EasterEgg,
    RapidInputBurst(u32),
    /// Minutes
    LongestSession(u32),
    /// Minutes
    LongestExamSession(u32),
    /// A new streak built after an earlier one broke
    RevivedStreak,
    /// Exactly one feature, the same one, on each of the last seven days
    SingleFeatureWeek,
    AllFeaturesEver,
    AllFeaturesToday,
    PageNotFound,
    HiddenFeature,
    ClockSkew,
}

/// How a badge unlocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeRule {
    XpThreshold(u64),
    ActionThreshold { kind: ActionKind, count: u32 },
    StreakThreshold(u32),
    BadgeCountThreshold(usize),
    Calendar(CalendarCondition),
    Composite(CompositeCondition),
    AllOf(Vec<BadgeRule>),
    /// Tied to a feature the app does not have; never unlocks by itself
    Reserved,
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub rule: BadgeRule,
    /// Hidden from the catalog view until unlocked
    pub secret: bool,
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Inputs of one evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub state: &'a ProgressState,
    pub now: DateTime<FixedOffset>,
}

impl<'a> EvalContext<'a> {
    pub fn new(state: &'a ProgressState, now: DateTime<FixedOffset>) -> Self {
        Self { state, now }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    fn today_stats(&self) -> Option<&'a DayStats> {
        self.state.day(self.today())
    }

    fn days_since_first_use(&self) -> Option<i64> {
        self.state
            .first_use
            .map(|first| (self.today() - first).num_days())
    }

    /// Dates from six days ago through today
    fn last_week(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let today = self.today();
        (0..WEEK_DAYS).rev().map(move |back| today - Duration::days(back))
    }
}

impl CalendarCondition {
    pub fn is_satisfied(&self, ctx: &EvalContext<'_>) -> bool {
        match *self {
            CalendarCondition::HourWindow { from, to } => {
                let hour = ctx.now.hour();
                if from <= to {
                    (from..=to).contains(&hour)
                } else {
                    hour >= from || hour <= to
                }
            }
            CalendarCondition::Weekend => {
                matches!(ctx.now.weekday(), Weekday::Sat | Weekday::Sun)
            }
            CalendarCondition::Weekday(day) => ctx.now.weekday() == day,
            CalendarCondition::DayOfYear { month, day } => {
                ctx.now.month() == month && ctx.now.day() == day
            }
            CalendarCondition::DaysSinceFirstUse(days) => {
                ctx.days_since_first_use().is_some_and(|elapsed| elapsed >= days)
            }
        }
    }
}

impl CompositeCondition {
    pub fn is_satisfied(&self, ctx: &EvalContext<'_>) -> bool {
        let state = ctx.state;
        let events = &state.special_events;
        let today = ctx.today_stats();

        match *self {
            CompositeCondition::DistinctFeaturesToday(n) => {
                today.is_some_and(|day| day.features.len() >= n)
            }
            CompositeCondition::RequiredFeaturesToday(required) => {
                today.is_some_and(|day| required.iter().all(|f| day.has_feature(f)))
            }
            CompositeCondition::DecksToday(n) => today.is_some_and(|day| day.decks_created >= n),
            CompositeCondition::ItemsToday(n) => {
                today.is_some_and(|day| day.quizzes_generated.saturating_add(day.decks_created) >= n)
            }
            CompositeCondition::WeeklyXp(n) => {
                let earned = ctx
                    .last_week()
                    .filter_map(|date| state.day(date))
                    .fold(0u64, |total, day| total.saturating_add(day.xp_earned));
                earned >= n
            }
            CompositeCondition::FirstDayXp(n) => {
                ctx.days_since_first_use() == Some(0) && state.xp >= n
            }
            CompositeCondition::TotalDaysUsed(n) => state.total_days_used >= n,
            CompositeCondition::PerfectScores(n) => state.perfect_scores >= n,
            CompositeCondition::LargestFile(bytes) => events.largest_file_uploaded >= bytes,
            CompositeCondition::WordsWritten(n) => state.total_words_written >= n,
            CompositeCondition::DistinctTopics(n) => state.note_topics.len() >= n,
            CompositeCondition::HardQuizToday => today.is_some_and(|day| {
                day.quiz_difficulties
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case("hard"))
            }),
            CompositeCondition::HardQuizRun(n) => events.hard_quiz_run >= n,
            CompositeCondition::EasterEgg => events.konami_code_used,
            CompositeCondition::RapidInputBurst(n) => events.button_mash_count >= n,
            CompositeCondition::LongestSession(minutes) => events.longest_session >= minutes,
            CompositeCondition::LongestExamSession(minutes) => {
                events.longest_exam_session >= minutes
            }
            CompositeCondition::RevivedStreak => {
                !state.streak_history.is_empty() && state.streak >= REVIVED_STREAK_MIN
            }
            CompositeCondition::SingleFeatureWeek => {
                let mut only: Option<&str> = None;
                ctx.last_week().all(|date| match state.day(date) {
                    Some(day) if day.features.len() == 1 => {
                        let feature = day.features[0].as_str();
                        *only.get_or_insert(feature) == feature
                    }
                    _ => false,
                })
            }
            CompositeCondition::AllFeaturesEver => {
                let used: HashSet<&str> = state
                    .daily_stats
                    .values()
                    .flat_map(|day| day.features.iter().map(String::as_str))
                    .collect();
                ALL_FEATURES.iter().all(|f| used.contains(f))
            }
            CompositeCondition::AllFeaturesToday => {
                today.is_some_and(|day| ALL_FEATURES.iter().all(|f| day.has_feature(f)))
            }
            CompositeCondition::PageNotFound => events.page_not_found_visited,
            CompositeCondition::HiddenFeature => events.hidden_feature_found,
            CompositeCondition::ClockSkew => events.clock_skew_detected,
        }
    }
}

impl BadgeRule {
    pub fn is_satisfied(&self, ctx: &EvalContext<'_>) -> bool {
        let state = ctx.state;
        match self {
            BadgeRule::XpThreshold(xp) => state.xp >= *xp,
            BadgeRule::ActionThreshold { kind, count } => state.actions.get(*kind) >= *count,
            BadgeRule::StreakThreshold(days) => state.streak >= *days,
            BadgeRule::BadgeCountThreshold(n) => state.badges.len() >= *n,
            BadgeRule::Calendar(condition) => condition.is_satisfied(ctx),
            BadgeRule::Composite(condition) => condition.is_satisfied(ctx),
            BadgeRule::AllOf(rules) => rules.iter().all(|rule| rule.is_satisfied(ctx)),
            BadgeRule::Reserved => false,
        }
    }
}

/// Unlock every badge whose rule now holds.
///
/// Newly unlocked ids are appended to `state.badges` in catalog order. Scans
/// repeat until nothing changes, so badge-count badges see unlocks from the
/// same call. Already unlocked badges are never re-added or removed.
pub fn evaluate_badges(
    state: &mut ProgressState,
    now: DateTime<FixedOffset>,
) -> Vec<&'static BadgeDefinition> {
    let mut unlocked = Vec::new();

    loop {
        let newly: Vec<&'static BadgeDefinition> = {
            let ctx = EvalContext::new(state, now);
            catalog()
                .iter()
                .filter(|badge| !state.has_badge(badge.id) && badge.rule.is_satisfied(&ctx))
                .collect()
        };

        if newly.is_empty() {
            break;
        }

        for badge in newly {
            tracing::debug!(badge = badge.id, "Badge unlocked");
            state.badges.push(badge.id.to_string());
            unlocked.push(badge);
        }
    }

    unlocked
}
