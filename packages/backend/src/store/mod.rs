//! Learner record store.
//!
//! The engine never touches storage; callers read history through
//! [`PerformanceStore`] and assemble a snapshot from it.

pub mod memory;
pub mod models;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use models::{ChatMessage, ChatRole, Lesson, NewSubmission, PracticeProblem, TestCase};
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait PerformanceStore: Send + Sync {
    /// Stored profile level, `None` when the learner has no profile
    async fn baseline_skill_level(&self, user_id: &str) -> Result<Option<u32>, StoreError>;

    async fn completed_lesson_count(&self, user_id: &str) -> Result<u32, StoreError>;

    /// Pass/fail of the latest graded submissions, most recent first
    async fn recent_outcomes(&self, user_id: &str, limit: usize) -> Result<Vec<bool>, StoreError>;

    async fn record_submission(&self, submission: &NewSubmission) -> Result<(), StoreError>;

    /// Idempotent
    async fn mark_lesson_complete(&self, user_id: &str, lesson_id: &str) -> Result<(), StoreError>;

    /// Ordered by `order_number`
    async fn lessons(&self) -> Result<Vec<Lesson>, StoreError>;

    /// Ordered by `order_number`
    async fn problems(&self) -> Result<Vec<PracticeProblem>, StoreError>;

    async fn save_conversation(&self, user_id: &str, messages: &[ChatMessage]) -> Result<(), StoreError>;

    async fn conversation(&self, user_id: &str) -> Result<Vec<ChatMessage>, StoreError>;
}
