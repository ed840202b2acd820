//! # Progress Engine
//!
//! Turns learner activity into XP, streaks and badges.
//!
//! Every mutating call runs inside one [`ProgressStore::update`]: the change is
//! applied, badges are re-evaluated against the new state, and the result is
//! persisted once. With a fixed demo store the calls are no-ops.
//!
//! Nothing here returns an error. Persistence failures are logged by the
//! store and the in-memory state carries on.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::badges::{BadgeDefinition, RAPID_INPUT_WINDOW_MS, evaluate_badges};
use super::catalog::catalog;
use super::state::{ActionKind, FEATURE_SUMMARY, ProgressState, StreakRun};
use super::store::{ProgressStore, Role, open_progress_store};
use crate::clock::Clock;
use crate::storage::KeyedStore;

/// XP needed per level
pub const XP_PER_LEVEL: u64 = 100;

/// Delay between consecutive notifications
pub const NOTIFICATION_STAGGER: std::time::Duration = std::time::Duration::from_secs(1);

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Optional details of a logged action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionContext {
    pub difficulty: Option<String>,
    pub topic: Option<String>,
    pub word_count: Option<u64>,
    /// Bytes
    pub file_size: Option<u64>,
    pub session_minutes: Option<u32>,
    /// Percent
    pub score: Option<u32>,
}

impl ActionContext {
    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_word_count(mut self, words: u64) -> Self {
        self.word_count = Some(words);
        self
    }

    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size = Some(bytes);
        self
    }

    pub fn with_session_minutes(mut self, minutes: u32) -> Self {
        self.session_minutes = Some(minutes);
        self
    }

    pub fn with_score(mut self, score: u32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Events that only feed secret badges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialEvent {
    FileUpload { bytes: u64 },
    SessionLength { minutes: u32 },
    ExamSession { minutes: u32 },
    PageNotFound,
    HiddenFeature,
}

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// Level breakdown derived from XP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDetails {
    pub level: u64,
    pub xp_into_level: u64,
    pub progress_percent: u64,
    pub xp_to_next_level: u64,
}

impl LevelDetails {
    pub fn for_xp(xp: u64) -> Self {
        let level = xp / XP_PER_LEVEL + 1;
        let xp_into_level = xp - (level - 1) * XP_PER_LEVEL;
        Self {
            level,
            xp_into_level,
            progress_percent: xp_into_level * 100 / XP_PER_LEVEL,
            xp_to_next_level: XP_PER_LEVEL - xp_into_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NotificationKind {
    BadgeUnlocked { badge_id: String },
    StreakIncreased { streak: u32 },
}

/// A user-facing message, shown `delay` after the batch it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub delay: std::time::Duration,
}

/// One row of the badge list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeView {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub secret: bool,
    pub unlocked: bool,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct ProgressEngine {
    store: Box<dyn ProgressStore>,
    clock: Arc<dyn Clock>,
    pending: Vec<(NotificationKind, String, String)>,
}

impl ProgressEngine {
    pub fn new(store: Box<dyn ProgressStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            pending: Vec::new(),
        }
    }

    /// Engine for `role`, persisting through `keyed` and sharing its clock.
    pub fn open(role: Role, keyed: Arc<KeyedStore>) -> Self {
        let clock = keyed.clock();
        Self::new(open_progress_store(role, keyed), clock)
    }

    pub fn state(&self) -> &ProgressState {
        self.store.state()
    }

    /// Run `mutation`, re-evaluate badges and persist.
    ///
    /// Returns the mutation's result, or `None` when the store is fixed.
    fn apply<R>(
        &mut self,
        mutation: impl FnOnce(&mut ProgressState, DateTime<FixedOffset>) -> R,
    ) -> Option<R> {
        let now = self.clock.now();
        let mut mutation = Some(mutation);
        let mut result = None;
        let mut unlocked: Vec<&'static BadgeDefinition> = Vec::new();

        let applied = self.store.update(&mut |state| {
            if let Some(mutation) = mutation.take() {
                result = Some(mutation(state, now));
            }
            unlocked = evaluate_badges(state, now);
        });

        if !applied {
            return None;
        }

        for badge in unlocked {
            self.pending.push((
                NotificationKind::BadgeUnlocked {
                    badge_id: badge.id.to_string(),
                },
                "New Badge Unlocked!".to_string(),
                format!("{} You've earned the \u{201c}{}\u{201d} badge!", badge.icon, badge.name),
            ));
        }
        result
    }

    /// Reconcile the streak with today's date. Call once per load.
    pub fn start_session(&mut self) {
        let streak = self
            .apply(|state, now| {
                let today = now.date_naive();
                state.first_use.get_or_insert(today);

                let mut increased = None;
                let new_day = match state.last_login {
                    None => {
                        state.streak = state.streak.max(1);
                        true
                    }
                    Some(last) => match (today - last).num_days() {
                        days if days < 0 => {
                            tracing::warn!(%last, %today, "Clock moved backwards since last session");
                            state.special_events.clock_skew_detected = true;
                            false
                        }
                        0 if state.streak == 0 => {
                            state.streak = 1;
                            true
                        }
                        0 => false,
                        1 => {
                            state.streak = state.streak.saturating_add(1);
                            if state.streak > 1 {
                                increased = Some(state.streak);
                            }
                            true
                        }
                        _ => {
                            if state.streak > 0 {
                                let span = Duration::days(i64::from(state.streak) - 1);
                                state.streak_history.push(StreakRun {
                                    start: last.checked_sub_signed(span).unwrap_or(NaiveDate::MIN),
                                    end: last,
                                    length: state.streak,
                                });
                            }
                            state.streak = 1;
                            true
                        }
                    },
                };

                if new_day {
                    state.total_days_used = state.total_days_used.saturating_add(1);
                    let week = state.week_mut(today);
                    week.days_active = week.days_active.saturating_add(1);
                }
                state.last_login = Some(today);
                increased
            })
            .flatten();

        if let Some(streak) = streak {
            // streak notice goes ahead of any badges it unlocked
            self.pending.insert(
                0,
                (
                    NotificationKind::StreakIncreased { streak },
                    "Streak Increased!".to_string(),
                    format!("You're on a {streak}-day streak! \u{1f525}"),
                ),
            );
        }
    }

    pub fn add_experience(&mut self, amount: u64) {
        self.apply(|state, now| {
            let today = now.date_naive();
            state.xp = state.xp.saturating_add(amount);
            let day = state.day_mut(today);
            day.xp_earned = day.xp_earned.saturating_add(amount);
            let week = state.week_mut(today);
            week.xp_earned = week.xp_earned.saturating_add(amount);
        });
    }

    /// Count an action and fold its details into the stats. Awards no XP.
    pub fn log_action(&mut self, kind: ActionKind, context: &ActionContext) {
        self.apply(|state, now| {
            let today = now.date_naive();
            state.actions.increment(kind);

            let day = state.day_mut(today);
            day.add_feature(kind.feature());
            day.time_of_day.push(now.hour());
            day.count_action(kind);
            if let Some(difficulty) = &context.difficulty {
                day.quiz_difficulties.push(difficulty.clone());
            }
            if let Some(topic) = &context.topic {
                day.quiz_topics.push(topic.clone());
            }

            if let Some(topic) = &context.topic {
                state.add_topic(topic);
            }
            if let Some(words) = context.word_count {
                state.total_words_written = state.total_words_written.saturating_add(words);
            }

            let events = &mut state.special_events;
            if let Some(bytes) = context.file_size {
                events.largest_file_uploaded = events.largest_file_uploaded.max(bytes);
            }
            if let Some(minutes) = context.session_minutes {
                events.longest_session = events.longest_session.max(minutes);
                if kind == ActionKind::TakeExam {
                    events.longest_exam_session = events.longest_exam_session.max(minutes);
                }
            }
            if kind == ActionKind::GenerateQuiz {
                let hard = context
                    .difficulty
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case("hard"));
                events.hard_quiz_run = if hard {
                    events.hard_quiz_run.saturating_add(1)
                } else {
                    0
                };
            }
            if context.score == Some(100) {
                state.perfect_scores = state.perfect_scores.saturating_add(1);
            }
        });
    }

    /// Note that a feature was touched today without a countable action.
    pub fn track_feature_use(&mut self, feature: &str) {
        self.apply(|state, now| {
            let day = state.day_mut(now.date_naive());
            day.add_feature(feature);
            if feature == FEATURE_SUMMARY {
                day.summaries_generated = day.summaries_generated.saturating_add(1);
            }
        });
    }

    pub fn track_special_event(&mut self, event: SpecialEvent) {
        self.apply(|state, _| {
            let events = &mut state.special_events;
            match event {
                SpecialEvent::FileUpload { bytes } => {
                    events.largest_file_uploaded = events.largest_file_uploaded.max(bytes);
                }
                SpecialEvent::SessionLength { minutes } => {
                    events.longest_session = events.longest_session.max(minutes);
                }
                SpecialEvent::ExamSession { minutes } => {
                    events.longest_exam_session = events.longest_exam_session.max(minutes);
                    events.longest_session = events.longest_session.max(minutes);
                }
                SpecialEvent::PageNotFound => events.page_not_found_visited = true,
                SpecialEvent::HiddenFeature => events.hidden_feature_found = true,
            }
        });
    }

    pub fn trigger_easter_egg(&mut self) {
        self.apply(|state, _| state.special_events.konami_code_used = true);
    }

    /// Count one input of a rapid-input burst.
    pub fn track_rapid_input(&mut self) {
        self.apply(|state, now| {
            let now_ms = now.timestamp_millis();
            let events = &mut state.special_events;
            if now_ms.saturating_sub(events.button_mash_timestamp) < RAPID_INPUT_WINDOW_MS {
                events.button_mash_count = events.button_mash_count.saturating_add(1);
            } else {
                events.button_mash_count = 1;
            }
            events.button_mash_timestamp = now_ms;
        });
    }

    pub fn level_details(&self) -> LevelDetails {
        LevelDetails::for_xp(self.state().xp)
    }

    /// Take queued notifications, staggered one second apart.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.pending
            .drain(..)
            .zip(0u32..)
            .map(|((kind, title, message), index)| Notification {
                kind,
                title,
                message,
                delay: NOTIFICATION_STAGGER * index,
            })
            .collect()
    }

    /// Badge list for display; locked secret badges are left out.
    pub fn catalog_view(&self) -> Vec<BadgeView> {
        let state = self.state();
        catalog()
            .iter()
            .filter_map(|badge| {
                let unlocked = state.has_badge(badge.id);
                (unlocked || !badge.secret).then(|| BadgeView {
                    id: badge.id.to_string(),
                    name: badge.name.to_string(),
                    icon: badge.icon.to_string(),
                    description: badge.description.to_string(),
                    secret: badge.secret,
                    unlocked,
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for ProgressEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEngine")
            .field("xp", &self.state().xp)
            .field("streak", &self.state().streak)
            .field("pending", &self.pending.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
