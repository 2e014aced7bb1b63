use futures::future::try_join3;
use serde::Serialize;
use tracing::warn;

use pylearn_algo::{
    derive_policy, score_breakdown, ContentPolicy, PerformanceSnapshot, ScoreBreakdown,
    DEFAULT_RECENT_WINDOW, DEFAULT_SKILL_LEVEL, DEFAULT_SUCCESS_WINDOW,
};

use crate::config::Config;
use crate::store::{PerformanceStore, StoreError};

// ========== Types ==========

/// A learner's snapshot with the score and policy derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerStanding {
    pub snapshot: PerformanceSnapshot,
    pub breakdown: ScoreBreakdown,
    pub policy: ContentPolicy,
    /// Submissions read to build the snapshot, across both windows
    pub attempts_considered: usize,
}

impl LearnerStanding {
    pub fn from_snapshot(snapshot: PerformanceSnapshot) -> Self {
        let breakdown = score_breakdown(&snapshot);
        Self {
            policy: derive_policy(breakdown.total),
            breakdown,
            attempts_considered: snapshot.recent_performance.len(),
            snapshot,
        }
    }

    pub fn with_attempts_considered(mut self, attempts: usize) -> Self {
        self.attempts_considered = attempts;
        self
    }

    pub fn skill_score(&self) -> f64 {
        self.breakdown.total
    }
}

// ========== Assembler ==========

/// Reads learner history from the store and builds a [`PerformanceSnapshot`].
#[derive(Debug, Clone, Copy)]
pub struct SnapshotAssembler {
    success_window: usize,
    recent_window: usize,
}

impl SnapshotAssembler {
    pub fn new(success_window: usize, recent_window: usize) -> Self {
        Self {
            success_window: success_window.max(1),
            recent_window: recent_window.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.success_window, config.recent_window)
    }

    async fn fetch(
        &self,
        store: &dyn PerformanceStore,
        user_id: &str,
    ) -> Result<(PerformanceSnapshot, usize), StoreError> {
        let limit = self.success_window.max(self.recent_window);
        let (skill_level, completed_lessons, outcomes) = try_join3(
            store.baseline_skill_level(user_id),
            store.completed_lesson_count(user_id),
            store.recent_outcomes(user_id, limit),
        )
        .await?;

        let snapshot = PerformanceSnapshot::from_outcomes(
            skill_level.unwrap_or(DEFAULT_SKILL_LEVEL),
            completed_lessons,
            &outcomes,
            self.success_window,
            self.recent_window,
        );
        Ok((snapshot, outcomes.len().min(limit)))
    }

    pub async fn try_assemble(
        &self,
        store: &dyn PerformanceStore,
        user_id: &str,
    ) -> Result<PerformanceSnapshot, StoreError> {
        Ok(self.fetch(store, user_id).await?.0)
    }

    /// Never fails: a store error yields the brand-new-learner snapshot.
    pub async fn assemble(&self, store: &dyn PerformanceStore, user_id: &str) -> PerformanceSnapshot {
        self.standing(store, user_id).await.snapshot
    }

    pub async fn standing(&self, store: &dyn PerformanceStore, user_id: &str) -> LearnerStanding {
        match self.fetch(store, user_id).await {
            Ok((snapshot, attempts)) => LearnerStanding::from_snapshot(snapshot).with_attempts_considered(attempts),
            Err(err) => {
                warn!(user_id, error = %err, "snapshot fetch failed, using new-learner defaults");
                LearnerStanding::from_snapshot(PerformanceSnapshot::new_learner())
            }
        }
    }
}

impl Default for SnapshotAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_WINDOW, DEFAULT_RECENT_WINDOW)
    }
}
