//! Convenience re-exports for common test utilities.

pub use crate::fixtures::{SnapshotSequence, dashboard_snapshot, frame_with_payload, reference_frame};
pub use crate::must::{must, must_some, must_with, must_within};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
