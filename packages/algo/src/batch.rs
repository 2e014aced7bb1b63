//! Batch scoring
//!
//! Scores many learners at once (cohort dashboards). Every call is pure, so the
//! work is split across the rayon pool with no coordination.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::policy::derive_policy;
use crate::scoring::compute_skill_score;
use crate::types::{ContentPolicy, PerformanceSnapshot};

/// Score and policy of one snapshot
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredPolicy {
    pub skill_score: f64,
    pub policy: ContentPolicy,
}

pub fn score_and_derive(snapshot: &PerformanceSnapshot) -> ScoredPolicy {
    let skill_score = compute_skill_score(snapshot);
    ScoredPolicy {
        skill_score,
        policy: derive_policy(skill_score),
    }
}

/// Results in input order.
pub fn batch_score(snapshots: &[PerformanceSnapshot]) -> Vec<ScoredPolicy> {
    snapshots.par_iter().map(score_and_derive).collect()
}
