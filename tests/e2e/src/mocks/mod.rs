//! Test data

mod fixtures;

pub use fixtures::{StudyNote, TestDataFactory};
