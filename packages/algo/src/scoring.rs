//! Skill Scoring
//!
//! Weighted linear blend of three independently capped signals:
//! - Lesson volume: `min(completed_lessons * 2, 40)`
//! - Historical accuracy: `success_rate * 30`
//! - Recent trend: `mean(recent_performance) * 30`
//!
//! The accuracy and trend signals are drawn from overlapping windows, so a
//! hot or cold streak moves the score quickly.

use crate::types::{
    PerformanceSnapshot, ScoreBreakdown, ACCURACY_WEIGHT, LESSON_COMPONENT_CAP, LESSON_POINTS,
    MAX_SKILL_SCORE, TREND_WEIGHT,
};

/// Per-component view of a skill score.
///
/// No validation: out-of-domain inputs propagate arithmetically.
pub fn score_breakdown(snapshot: &PerformanceSnapshot) -> ScoreBreakdown {
    let lesson_component =
        (f64::from(snapshot.completed_lessons) * LESSON_POINTS).min(LESSON_COMPONENT_CAP);
    let accuracy_component = snapshot.success_rate * ACCURACY_WEIGHT;
    let trend_component = snapshot.recent_average() * TREND_WEIGHT;

    let total = (lesson_component + accuracy_component + trend_component).min(MAX_SKILL_SCORE);

    ScoreBreakdown {
        lesson_component,
        accuracy_component,
        trend_component,
        total,
    }
}

/// Skill score in [0, 100] for in-domain snapshots.
pub fn compute_skill_score(snapshot: &PerformanceSnapshot) -> f64 {
    score_breakdown(snapshot).total
}
