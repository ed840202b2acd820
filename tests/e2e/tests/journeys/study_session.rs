//! Journey: a learner studies over several days
//!
//! Runs against SQLite on disk with a manual clock. Each day restarts the
//! store so progress must survive the round trip through the database.

use chrono::{Duration, NaiveDate};
use studymate_core::{Notification, NotificationKind, Role};
use studymate_e2e_tests::harness::TestStoreManager;
use studymate_e2e_tests::mocks::TestDataFactory;

/// 2026-09-01 is a Tuesday
const TUESDAY_MORNING: &str = "2026-09-01T10:00:00+02:00";

fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid date")
}

fn unlocked_ids(notifications: &[Notification]) -> Vec<&str> {
    notifications
        .iter()
        .filter_map(|n| match &n.kind {
            NotificationKind::BadgeUnlocked { badge_id } => Some(badge_id.as_str()),
            NotificationKind::StreakIncreased { .. } => None,
        })
        .collect()
}

#[test]
fn test_first_day_unlocks_starter_badges() {
    let env = TestStoreManager::new_temp(TUESDAY_MORNING);
    let mut engine = env.engine(Role::Learner);

    TestDataFactory::study_day(&mut engine);

    let state = engine.state();
    assert_eq!(state.xp, 60);
    assert_eq!(state.streak, 1);
    assert_eq!(state.total_days_used, 1);
    assert_eq!(state.first_use, Some(date("2026-09-01")));

    let notifications = engine.drain_notifications();
    assert_eq!(
        unlocked_ids(&notifications),
        vec![
            "first-note",
            "first-summary",
            "first-quiz",
            "first-deck",
            "hat-trick",
            "all-features",
            "ai-collaborator",
        ]
    );
    // no streak notice on the very first day
    assert_eq!(unlocked_ids(&notifications).len(), notifications.len());

    for (i, n) in notifications.iter().enumerate() {
        assert_eq!(n.delay, std::time::Duration::from_secs(i as u64));
        assert_eq!(n.title, "New Badge Unlocked!");
    }
    assert!(engine.drain_notifications().is_empty());
}

#[test]
fn test_streak_grows_across_restarts() {
    let mut env = TestStoreManager::new_temp(TUESDAY_MORNING);
    let mut engine = env.engine(Role::Learner);
    TestDataFactory::study_day(&mut engine);
    drop(engine);

    // reopening on the same day changes nothing
    env.restart();
    let mut engine = env.engine(Role::Learner);
    assert_eq!(engine.state().streak, 1);
    assert_eq!(engine.state().total_days_used, 1);
    assert!(engine.drain_notifications().is_empty());

    let mut engine = env.next_day();
    assert_eq!(engine.state().streak, 2);
    assert_eq!(engine.state().xp, 60);
    let notifications = engine.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0].kind,
        NotificationKind::StreakIncreased { streak: 2 }
    );
    assert_eq!(notifications[0].message, "You're on a 2-day streak! \u{1f525}");

    let mut engine = env.next_day();
    let notifications = engine.drain_notifications();
    assert_eq!(notifications.len(), 2);
    assert_eq!(
        notifications[0].kind,
        NotificationKind::StreakIncreased { streak: 3 }
    );
    assert_eq!(notifications[0].delay, std::time::Duration::ZERO);
    assert_eq!(unlocked_ids(&notifications), vec!["streak-3"]);
    assert_eq!(notifications[1].delay, std::time::Duration::from_secs(1));

    assert_eq!(engine.state().total_days_used, 3);
    assert_eq!(engine.state().last_login, Some(date("2026-09-03")));
}

#[test]
fn test_broken_streak_is_recorded_and_revived() {
    let mut env = TestStoreManager::new_temp(TUESDAY_MORNING);
    let mut engine = env.engine(Role::Learner);
    TestDataFactory::study_day(&mut engine);
    drop(engine);
    env.next_day();
    env.next_day();

    // Thursday -> Sunday skips two days
    env.advance(Duration::days(3));
    env.restart();
    let mut engine = env.engine(Role::Learner);
    assert_eq!(engine.state().streak, 1);
    let run = &engine.state().streak_history[0];
    assert_eq!(
        (run.start, run.end, run.length),
        (date("2026-09-01"), date("2026-09-03"), 3)
    );
    assert_eq!(unlocked_ids(&engine.drain_notifications()), vec!["weekend-warrior"]);

    env.next_day();
    let mut engine = env.next_day();
    assert_eq!(engine.state().streak, 3);

    // the tenth badge pulls in badge-hunter during the same evaluation
    assert_eq!(
        unlocked_ids(&engine.drain_notifications()),
        vec!["secret-7", "badge-hunter"]
    );
    assert_eq!(engine.state().badges.len(), 11);
}

#[test]
fn test_clock_moving_backwards_keeps_streak() {
    let mut env = TestStoreManager::new_temp(TUESDAY_MORNING);
    env.engine(Role::Learner);

    env.advance(Duration::days(-1));
    env.restart();
    let mut engine = env.engine(Role::Learner);

    assert_eq!(engine.state().streak, 1);
    assert_eq!(engine.state().total_days_used, 1);
    assert_eq!(engine.state().last_login, Some(date("2026-08-31")));
    assert!(engine.state().special_events.clock_skew_detected);
    assert_eq!(unlocked_ids(&engine.drain_notifications()), vec!["secret-3"]);
}

#[test]
fn test_big_first_day_levels_up() {
    let env = TestStoreManager::new_temp(TUESDAY_MORNING);
    let mut engine = env.engine(Role::Learner);

    engine.add_experience(250);

    let level = engine.level_details();
    assert_eq!(level.level, 3);
    assert_eq!(level.xp_into_level, 50);
    assert_eq!(level.progress_percent, 50);
    assert_eq!(level.xp_to_next_level, 50);
    assert_eq!(
        unlocked_ids(&engine.drain_notifications()),
        vec!["level-2", "quick-learner"]
    );

    let week = engine.state().weekly_stats.get("2026-W36").expect("week stats");
    assert_eq!(week.xp_earned, 250);
    assert_eq!(week.days_active, 1);
}

#[test]
fn test_catalog_view_reveals_unlocked_secrets() {
    let env = TestStoreManager::new_temp(TUESDAY_MORNING);
    let mut engine = env.engine(Role::Learner);

    let hidden = engine.catalog_view();
    assert!(hidden.iter().all(|b| !b.secret));
    assert!(hidden.iter().all(|b| !b.unlocked));

    engine.trigger_easter_egg();

    let view = engine.catalog_view();
    assert_eq!(view.len(), hidden.len() + 1);
    let konami = view.iter().find(|b| b.id == "secret-1").expect("revealed");
    assert!(konami.secret && konami.unlocked);
}
