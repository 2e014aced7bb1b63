//! Lessons and problems filtered by a learner's content policy.

use tracing::debug;

use pylearn_algo::{filter_visible, ContentPolicy};

use crate::store::{Lesson, PerformanceStore, PracticeProblem, StoreError};

pub async fn visible_lessons(
    store: &dyn PerformanceStore,
    policy: &ContentPolicy,
) -> Result<Vec<Lesson>, StoreError> {
    let lessons = store.lessons().await?;
    let visible: Vec<Lesson> = filter_visible(&lessons, policy).into_iter().cloned().collect();
    debug!(total = lessons.len(), visible = visible.len(), tier = policy.difficulty_tier().as_str(), "lessons gated");
    Ok(visible)
}

pub async fn visible_problems(
    store: &dyn PerformanceStore,
    policy: &ContentPolicy,
) -> Result<Vec<PracticeProblem>, StoreError> {
    let problems = store.problems().await?;
    let visible: Vec<PracticeProblem> = filter_visible(&problems, policy).into_iter().cloned().collect();
    debug!(total = problems.len(), visible = visible.len(), tier = policy.difficulty_tier().as_str(), "problems gated");
    Ok(visible)
}
