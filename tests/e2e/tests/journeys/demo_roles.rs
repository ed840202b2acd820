//! Journey: demonstration identities next to a real learner

use studymate_core::progress::{JUDGE_BADGES, PROGRESS_KEY, catalog};
use studymate_core::{ActionContext, ActionKind, Role, SpecialEvent};
use studymate_e2e_tests::harness::TestStoreManager;
use studymate_e2e_tests::mocks::TestDataFactory;

const START: &str = "2026-02-10T14:00:00+00:00";

#[test]
fn test_owner_sees_everything_and_writes_nothing() {
    let env = TestStoreManager::new_temp(START);
    let mut engine = env.engine(Role::Owner);

    assert_eq!(engine.state().xp, 10_000);
    assert_eq!(engine.state().streak, 365);
    assert_eq!(engine.state().badges.len(), catalog().len());
    assert_eq!(engine.level_details().level, 101);

    TestDataFactory::study_day(&mut engine);
    engine.track_special_event(SpecialEvent::PageNotFound);
    engine.trigger_easter_egg();

    assert_eq!(engine.state().xp, 10_000);
    assert!(!engine.state().special_events.page_not_found_visited);
    assert!(engine.drain_notifications().is_empty());
    assert!(env.store.keys().is_empty());

    // every badge shows, secrets included
    let view = engine.catalog_view();
    assert_eq!(view.len(), catalog().len());
    assert!(view.iter().all(|b| b.unlocked));
}

#[test]
fn test_judge_has_starter_progress() {
    let env = TestStoreManager::new_temp(START);
    let mut engine = env.engine(Role::Judge);

    assert_eq!(engine.state().xp, 750);
    assert_eq!(engine.state().streak, 10);
    assert_eq!(engine.level_details().level, 8);
    assert_eq!(engine.state().badges, JUDGE_BADGES);

    engine.log_action(ActionKind::TakeExam, &ActionContext::default().with_score(100));
    assert_eq!(engine.state().actions.take_exam, 1);
    assert_eq!(engine.state().perfect_scores, 1);
    assert!(env.store.raw(PROGRESS_KEY).is_none());

    let unlocked: Vec<String> = engine
        .catalog_view()
        .into_iter()
        .filter(|b| b.unlocked)
        .map(|b| b.id)
        .collect();
    assert_eq!(unlocked, JUDGE_BADGES);
}

#[test]
fn test_demo_session_leaves_learner_progress_alone() {
    let mut env = TestStoreManager::new_temp(START);
    let mut learner = env.engine(Role::Learner);
    TestDataFactory::study_day(&mut learner);
    drop(learner);
    let saved = env.store.raw(PROGRESS_KEY).expect("learner progress saved");

    for role in ["owner", "JUDGE"] {
        let role: Role = role.parse().expect("known role");
        let mut demo = env.engine(role);
        demo.add_experience(5_000);
    }

    assert_eq!(env.store.raw(PROGRESS_KEY).as_deref(), Some(saved.as_str()));

    env.restart();
    let learner = env.engine(Role::Learner);
    assert_eq!(learner.state().xp, 60);
    assert_eq!(learner.state().badges.len(), 7);
}

#[test]
fn test_unknown_role_is_rejected() {
    let err = "admin".parse::<Role>().unwrap_err();
    assert!(err.to_string().contains("admin"));
}
