//! StudyMate end-to-end test support
//!
//! - `harness`: isolated on-disk stores driven by a manual clock
//! - `mocks`: realistic study data

pub mod harness;
pub mod mocks;
