//! Content Policy
//!
//! Maps a skill score onto a tier and the policy bundle it gates, and decides
//! when a hint should be offered for the current problem.

use crate::types::{ContentPolicy, DifficultyTier, ADVANCED_THRESHOLD, INTERMEDIATE_THRESHOLD};

/// Tier bucket for a score. Left-closed, right-open; the top bucket is
/// unbounded, so scores outside [0, 100] land in the nearest bucket.
pub fn tier_for_score(score: f64) -> DifficultyTier {
    if score < INTERMEDIATE_THRESHOLD {
        DifficultyTier::Beginner
    } else if score < ADVANCED_THRESHOLD {
        DifficultyTier::Intermediate
    } else {
        DifficultyTier::Advanced
    }
}

pub fn derive_policy(score: f64) -> ContentPolicy {
    ContentPolicy::for_tier(tier_for_score(score))
}

/// True once the failed attempts on the current problem reach the policy's
/// threshold. The caller owns the running count.
pub fn should_surface_hint(failed_attempts: u32, policy: &ContentPolicy) -> bool {
    failed_attempts >= policy.hint_frequency().failure_threshold()
}
