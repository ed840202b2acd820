//! Test Data Factory
//!
//! Realistic study data for journey tests:
//! - Notes of varying size, including long repetitive ones that compress
//! - A scripted study day against the progress engine

use serde::{Deserialize, Serialize};
use studymate_core::{ActionContext, ActionKind, KeyedStore, ProgressEngine};

/// A saved note as the app stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyNote {
    pub title: String,
    pub content: String,
    pub topic: String,
    pub word_count: u64,
}

/// Factory for creating test data
pub struct TestDataFactory;

const TOPICS: [&str; 6] = [
    "Biology",
    "Chemistry",
    "History",
    "Calculus",
    "Literature",
    "Economics",
];

impl TestDataFactory {
    pub fn note(i: usize) -> StudyNote {
        let topic = TOPICS[i % TOPICS.len()];
        let content = format!("Lecture {i} on {topic}. Key terms, definitions and examples.");
        StudyNote {
            title: format!("{topic} notes #{i}"),
            word_count: content.split_whitespace().count() as u64,
            content,
            topic: topic.to_string(),
        }
    }

    /// A long note with ruled separators, the kind of value that compresses.
    pub fn long_note() -> StudyNote {
        let divider = format!("\n{}\n", "-".repeat(120));
        let content = (1..=20)
            .map(|section| format!("Section {section}: the cell membrane regulates transport."))
            .collect::<Vec<_>>()
            .join(&divider);
        StudyNote {
            title: "Cell biology, full chapter".to_string(),
            word_count: content.split_whitespace().count() as u64,
            content,
            topic: "Biology".to_string(),
        }
    }

    /// Save `count` notes under `note:<i>` keys. Returns the keys.
    pub fn seed_notes(store: &KeyedStore, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let key = format!("note:{i}");
                assert!(store.set_large(&key, &Self::note(i)));
                key
            })
            .collect()
    }

    /// A typical day: two notes, a quiz, a deck and a summary, with XP.
    pub fn study_day(engine: &mut ProgressEngine) {
        for i in 0..2 {
            let note = Self::note(i);
            engine.log_action(
                ActionKind::CreateNote,
                &ActionContext::default()
                    .with_topic(note.topic.clone())
                    .with_word_count(note.word_count),
            );
            engine.add_experience(10);
        }

        engine.log_action(
            ActionKind::GenerateQuiz,
            &ActionContext::default()
                .with_difficulty("medium")
                .with_topic("Chemistry")
                .with_score(80),
        );
        engine.add_experience(25);

        engine.log_action(ActionKind::CreateFlashcardDeck, &ActionContext::default());
        engine.add_experience(15);

        engine.track_feature_use("summary");
    }
}
