//! Journey: records on disk over time
//!
//! TTL expiry across restarts, cleanup of damaged rows, the read cache seen
//! from two handles, debounced drafts and schema migrations.

use chrono::Duration;
use serde_json::{Value, json};
use studymate_core::storage::DEFAULT_SCHEMA_VERSION;
use studymate_core::{
    DebouncedWriter, RecordMigration, SqliteSubstrate, StoreOptions, StoredRecord, Substrate,
};
use studymate_e2e_tests::harness::TestStoreManager;
use studymate_e2e_tests::mocks::{StudyNote, TestDataFactory};

const START: &str = "2026-03-14T09:30:00+00:00";

#[test]
fn test_temporary_value_expires_after_restart() {
    let mut env = TestStoreManager::new_temp(START);
    assert!(env.store.set_temporary("quiz:draft", &json!({"q": 3}), Duration::hours(1)));

    env.advance(Duration::minutes(59));
    env.restart();
    assert_eq!(env.store.get::<Value>("quiz:draft"), Some(json!({"q": 3})));

    env.advance(Duration::minutes(2));
    env.restart();
    assert_eq!(env.store.get::<Value>("quiz:draft"), None);
    // an expired record is deleted once it is read
    assert!(env.store.raw("quiz:draft").is_none());
}

#[test]
fn test_cleanup_removes_expired_and_damaged_rows() {
    let env = TestStoreManager::new_temp(START);
    TestDataFactory::seed_notes(&env.store, 3);
    assert!(env.store.set_temporary("session", &"abc", Duration::minutes(5)));

    // damage one row behind the store's back
    let raw = SqliteSubstrate::open_file(env.path()).expect("open substrate");
    raw.write("note:1", "~rle:\\").expect("raw write");
    raw.write("legacy", "plain text from an old build").expect("raw write");

    env.advance(Duration::minutes(10));
    let report = env.store.cleanup();

    assert_eq!(report.scanned, 5);
    assert_eq!(report.expired, 1);
    assert_eq!(report.corrupt, 2);

    let mut keys = env.store.keys();
    keys.sort();
    assert_eq!(keys, vec!["note:0", "note:2"]);
    assert_eq!(env.store.stats().item_count, 2);
}

#[test]
fn test_second_handle_sees_writes_after_cache_window() {
    let env = TestStoreManager::new_temp(START);
    let reader = env.second_handle();

    assert!(env.store.set("theme", &"light", &StoreOptions::default()));
    assert_eq!(reader.get::<String>("theme").as_deref(), Some("light"));

    assert!(env.store.set("theme", &"dark", &StoreOptions::default()));
    // still inside the five second freshness window
    env.advance(Duration::seconds(4));
    assert_eq!(reader.get::<String>("theme").as_deref(), Some("light"));

    env.advance(Duration::seconds(1));
    assert_eq!(reader.get::<String>("theme").as_deref(), Some("dark"));

    let stats = reader.stats();
    assert!((stats.cache_hit_rate - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_debounced_draft_lands_on_disk() {
    let mut env = TestStoreManager::new_temp(START);
    let draft_key = "note:draft";

    {
        let writer = DebouncedWriter::new(env.store.clone(), draft_key);
        let mut note = TestDataFactory::note(0);
        for word in ["mitochondria", "ribosome", "nucleus"] {
            note.content.push(' ');
            note.content.push_str(word);
            writer.push(note.clone());
            env.advance(Duration::milliseconds(300));
            assert!(!writer.poll());
        }
        assert!(env.store.raw(draft_key).is_none());

        env.advance(Duration::milliseconds(1000));
        assert!(writer.poll());
        assert!(!writer.is_pending());

        // a last edit is flushed when the writer goes away
        note.title = "Renamed".to_string();
        writer.push(note);
    }

    env.restart();
    let saved: StudyNote = env.store.get(draft_key).expect("draft saved");
    assert_eq!(saved.title, "Renamed");
    assert!(saved.content.ends_with("ribosome nucleus"));
}

fn rename_title(mut data: Value) -> Value {
    if let Some(obj) = data.as_object_mut() {
        if let Some(title) = obj.remove("name") {
            obj.insert("title".to_string(), title);
        }
    }
    data
}

fn add_word_count(mut data: Value) -> Value {
    if let Some(obj) = data.as_object_mut() {
        let words = obj
            .get("content")
            .and_then(Value::as_str)
            .map(|c| c.split_whitespace().count())
            .unwrap_or(0);
        obj.insert("wordCount".to_string(), json!(words));
        obj.entry("topic").or_insert(json!("General"));
    }
    data
}

#[test]
fn test_old_notes_migrate_in_place() {
    let mut env = TestStoreManager::new_temp(START);
    let old = StoreOptions::default().compressed().with_version("0.9.0");
    assert!(env.store.set("note:old", &json!({"name": "Krebs", "content": "citric acid cycle"}), &old));
    TestDataFactory::seed_notes(&env.store, 1);

    let migrations = [
        RecordMigration {
            from_version: "0.9.0",
            to_version: "0.9.5",
            transform: rename_title,
        },
        RecordMigration {
            from_version: "0.9.5",
            to_version: DEFAULT_SCHEMA_VERSION,
            transform: add_word_count,
        },
    ];

    env.advance(Duration::days(2));
    assert_eq!(env.store.migrate(&migrations), 1);
    // second run has nothing left to do
    assert_eq!(env.store.migrate(&migrations), 0);

    env.restart();
    let note: StudyNote = env.store.get("note:old").expect("migrated note reads");
    assert_eq!(note.title, "Krebs");
    assert_eq!(note.word_count, 3);
    assert_eq!(note.topic, "General");

    let record = StoredRecord::decode(&env.store.raw("note:old").expect("present")).expect("decodes");
    assert_eq!(record.version, DEFAULT_SCHEMA_VERSION);
    // write time is kept, not bumped to the migration time
    assert_eq!(
        record.timestamp,
        chrono::DateTime::parse_from_rfc3339(START)
            .expect("valid")
            .timestamp_millis()
    );
}
