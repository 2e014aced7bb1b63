pub mod catalog;
pub mod dashboard;
pub mod grading;
pub mod practice;
pub mod snapshot;

pub use dashboard::{summarize, DashboardSummary};
pub use grading::{grade, values_match, CaseResult, GradeReport};
pub use practice::{AttemptFeedback, PracticeSession};
pub use snapshot::{LearnerStanding, SnapshotAssembler};
