use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::{ChatMessage, Lesson, NewSubmission, PracticeProblem};
use super::{PerformanceStore, StoreError};

#[derive(Default)]
struct Inner {
    skill_levels: HashMap<String, u32>,
    completed: HashMap<String, HashSet<String>>,
    /// Oldest first; reads reverse it
    submissions: HashMap<String, Vec<NewSubmission>>,
    lessons: Vec<Lesson>,
    problems: Vec<PracticeProblem>,
    conversations: HashMap<String, Vec<ChatMessage>>,
}

/// Process-local store used by tests and as the offline fallback.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_skill_level(&self, user_id: &str, level: u32) {
        let mut inner = self.inner.write().await;
        inner.skill_levels.insert(user_id.to_string(), level);
    }

    /// Replaces a lesson with the same id.
    pub async fn upsert_lesson(&self, lesson: Lesson) {
        let mut inner = self.inner.write().await;
        inner.lessons.retain(|l| l.id != lesson.id);
        inner.lessons.push(lesson);
        inner.lessons.sort_by_key(|l| l.order_number);
    }

    /// Replaces a problem with the same id.
    pub async fn upsert_problem(&self, problem: PracticeProblem) {
        let mut inner = self.inner.write().await;
        inner.problems.retain(|p| p.id != problem.id);
        inner.problems.push(problem);
        inner.problems.sort_by_key(|p| p.order_number);
    }

    pub async fn submission_count(&self, user_id: &str) -> usize {
        let inner = self.inner.read().await;
        inner.submissions.get(user_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl PerformanceStore for MemoryStore {
    async fn baseline_skill_level(&self, user_id: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.inner.read().await.skill_levels.get(user_id).copied())
    }

    async fn completed_lesson_count(&self, user_id: &str) -> Result<u32, StoreError> {
        let inner = self.inner.read().await;
        let count = inner.completed.get(user_id).map_or(0, HashSet::len);
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn recent_outcomes(&self, user_id: &str, limit: usize) -> Result<Vec<bool>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .get(user_id)
            .map(|subs| subs.iter().rev().take(limit).map(|s| s.passed).collect())
            .unwrap_or_default())
    }

    async fn record_submission(&self, submission: &NewSubmission) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .submissions
            .entry(submission.user_id.clone())
            .or_default()
            .push(submission.clone());
        Ok(())
    }

    async fn mark_lesson_complete(&self, user_id: &str, lesson_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .completed
            .entry(user_id.to_string())
            .or_default()
            .insert(lesson_id.to_string());
        Ok(())
    }

    async fn lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        Ok(self.inner.read().await.lessons.clone())
    }

    async fn problems(&self) -> Result<Vec<PracticeProblem>, StoreError> {
        Ok(self.inner.read().await.problems.clone())
    }

    async fn save_conversation(&self, user_id: &str, messages: &[ChatMessage]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .conversations
            .insert(user_id.to_string(), messages.to_vec());
        Ok(())
    }

    async fn conversation(&self, user_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .conversations
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(user_id: &str, passed: bool) -> NewSubmission {
        NewSubmission {
            user_id: user_id.to_string(),
            problem_id: "p1".to_string(),
            code: "pass".to_string(),
            passed,
            result: None,
        }
    }

    #[tokio::test]
    async fn test_recent_outcomes_most_recent_first() {
        let store = MemoryStore::new();
        for passed in [true, true, false] {
            store.record_submission(&submission("u1", passed)).await.unwrap();
        }

        assert_eq!(store.recent_outcomes("u1", 10).await.unwrap(), vec![false, true, true]);
        assert_eq!(store.recent_outcomes("u1", 2).await.unwrap(), vec![false, true]);
        assert!(store.recent_outcomes("u2", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_lesson_complete_is_idempotent() {
        let store = MemoryStore::new();
        store.mark_lesson_complete("u1", "l1").await.unwrap();
        store.mark_lesson_complete("u1", "l1").await.unwrap();
        store.mark_lesson_complete("u1", "l2").await.unwrap();
        assert_eq!(store.completed_lesson_count("u1").await.unwrap(), 2);
        assert_eq!(store.completed_lesson_count("u2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lessons_sorted_and_replaced() {
        let store = MemoryStore::new();
        let lesson = |id: &str, order: i32, title: &str| Lesson {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            content: String::new(),
            code_example: None,
            difficulty: None,
            order_number: order,
        };

        store.upsert_lesson(lesson("b", 2, "Loops")).await;
        store.upsert_lesson(lesson("a", 1, "Variables")).await;
        store.upsert_lesson(lesson("b", 2, "Loops, revised")).await;

        let lessons = store.lessons().await.unwrap();
        let titles: Vec<&str> = lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Variables", "Loops, revised"]);
    }

    #[tokio::test]
    async fn test_baseline_skill_level() {
        let store = MemoryStore::new();
        assert_eq!(store.baseline_skill_level("u1").await.unwrap(), None);
        store.set_skill_level("u1", 4).await;
        assert_eq!(store.baseline_skill_level("u1").await.unwrap(), Some(4));
    }
}
