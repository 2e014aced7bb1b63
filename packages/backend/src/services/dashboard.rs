use serde::Serialize;

use pylearn_algo::{DifficultyTier, ScoreBreakdown};

use super::snapshot::LearnerStanding;

/// Progress overview shown on a learner's home screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub completed_lessons: u32,
    /// Percentage in 0..=100, rounded
    pub success_rate_percent: u32,
    pub skill_score: f64,
    pub breakdown: ScoreBreakdown,
    pub tier: DifficultyTier,
    /// Submissions behind the success rate and trend, whichever window is wider
    pub total_submissions_considered: usize,
}

pub fn summarize(standing: &LearnerStanding) -> DashboardSummary {
    let snapshot = &standing.snapshot;
    let percent = (snapshot.success_rate * 100.0).round().clamp(0.0, 100.0);

    DashboardSummary {
        completed_lessons: snapshot.completed_lessons,
        success_rate_percent: percent as u32,
        skill_score: standing.skill_score(),
        breakdown: standing.breakdown,
        tier: standing.policy.difficulty_tier(),
        total_submissions_considered: standing.attempts_considered,
    }
}
