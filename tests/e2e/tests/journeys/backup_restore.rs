//! Journey: back up everything on one machine and restore it on another

use studymate_core::storage::{COMPRESSED_PREFIX, EXPORT_FORMAT_VERSION, OBFUSCATED_PREFIX};
use studymate_core::{ExportSnapshot, Role};
use studymate_e2e_tests::harness::TestStoreManager;
use studymate_e2e_tests::mocks::{StudyNote, TestDataFactory};

const START: &str = "2026-05-12T18:45:00+01:00";

/// A populated store: notes, an API key, a long chapter and some progress.
fn populated() -> TestStoreManager {
    let env = TestStoreManager::new_temp(START);
    TestDataFactory::seed_notes(&env.store, 5);
    assert!(env.store.set_secure("apiKey", "sk-live-0123456789"));
    assert!(env.store.set_large("chapter", &TestDataFactory::long_note()));

    let mut engine = env.engine(Role::Learner);
    TestDataFactory::study_day(&mut engine);
    env
}

#[test]
fn test_restore_on_fresh_machine() {
    let source = populated();
    let backup = source.store.export_all();

    let target = TestStoreManager::new_temp(START);
    assert!(target.store.import_all(&backup));

    let mut keys = target.store.keys();
    keys.sort();
    assert_eq!(keys, {
        let mut expected = source.store.keys();
        expected.sort();
        expected
    });

    for i in 0..5 {
        let note: StudyNote = target.store.get(&format!("note:{i}")).expect("note restored");
        assert_eq!(note, TestDataFactory::note(i));
    }
    assert_eq!(
        target.store.get::<String>("apiKey").as_deref(),
        Some("sk-live-0123456789")
    );
    assert_eq!(
        target.store.get::<StudyNote>("chapter"),
        Some(TestDataFactory::long_note())
    );

    // progress comes back with the rest
    let engine = target.engine(Role::Learner);
    assert_eq!(engine.state().xp, 60);
    assert_eq!(engine.state().badges.len(), 7);
}

#[test]
fn test_backup_keeps_stored_layers() {
    let source = populated();
    let snapshot: ExportSnapshot =
        serde_json::from_str(&source.store.export_all()).expect("snapshot parses");

    assert_eq!(snapshot.version.as_deref(), Some(EXPORT_FORMAT_VERSION));
    assert!(snapshot.timestamp.is_some());

    let api_key = snapshot.data["apiKey"].as_deref().expect("present");
    assert!(api_key.starts_with(OBFUSCATED_PREFIX));
    assert!(!api_key.contains("sk-live"));

    let chapter = snapshot.data["chapter"].as_deref().expect("present");
    assert!(chapter.starts_with(COMPRESSED_PREFIX));
    assert!(!chapter.contains(&"-".repeat(120)));

    // small notes stay plain even though they were written with compression on
    let note = snapshot.data["note:0"].as_deref().expect("present");
    assert!(note.starts_with('{'));
}

#[test]
fn test_restore_replaces_existing_data() {
    let source = populated();
    let backup = source.store.export_all();

    let target = TestStoreManager::new_temp(START);
    assert!(target.store.set_large("scratch", &"left over from before"));
    assert!(target.store.import_all(&backup));

    assert!(target.store.get::<String>("scratch").is_none());
    assert!(target.store.get::<StudyNote>("note:3").is_some());
}

#[test]
fn test_bad_backup_changes_nothing() {
    let env = populated();
    let before = env.store.export_all();

    for bad in [
        "",
        "not json at all",
        r#"{"version":"1.0.0"}"#,
        r#"{"data":["a","b"]}"#,
        r#"{"data":{"note:0":42}}"#,
    ] {
        assert!(!env.store.import_all(bad), "accepted {bad:?}");
    }

    assert_eq!(env.store.export_all(), before);
    assert!(env.store.get::<StudyNote>("note:0").is_some());
}

#[test]
fn test_restore_survives_restart() {
    let source = populated();
    let backup = source.store.export_all();

    let mut target = TestStoreManager::new_temp(START);
    assert!(target.store.import_all(&backup));
    target.restart();

    assert_eq!(target.store.keys().len(), source.store.keys().len());
    assert_eq!(
        target.store.get::<String>("apiKey").as_deref(),
        Some("sk-live-0123456789")
    );
}
