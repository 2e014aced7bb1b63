//! Common Types and Constants
//!
//! Shared data structures used across the engine modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Points awarded per completed lesson
pub const LESSON_POINTS: f64 = 2.0;

/// Cap of the lesson-volume component (reached at 20 lessons)
pub const LESSON_COMPONENT_CAP: f64 = 40.0;

/// Weight of the historical-accuracy component
pub const ACCURACY_WEIGHT: f64 = 30.0;

/// Weight of the recent-trend component
pub const TREND_WEIGHT: f64 = 30.0;

/// Upper bound of a skill score
pub const MAX_SKILL_SCORE: f64 = 100.0;

/// Scores below this are beginner
pub const INTERMEDIATE_THRESHOLD: f64 = 30.0;

/// Scores at or above this are advanced
pub const ADVANCED_THRESHOLD: f64 = 70.0;

/// Number of graded attempts that make up `success_rate`
pub const DEFAULT_SUCCESS_WINDOW: usize = 10;

/// Number of graded attempts that make up `recent_performance`
pub const DEFAULT_RECENT_WINDOW: usize = 10;

/// Baseline level of a learner with no stored profile
pub const DEFAULT_SKILL_LEVEL: u32 = 1;

// ==================== Snapshot ====================

/// Learner performance assembled by the caller from stored history.
///
/// Transient: built per scoring call and discarded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    /// Stored baseline level (>= 1). Fallback only, never scored.
    pub skill_level_hint: u32,
    /// Lessons marked complete
    pub completed_lessons: u32,
    /// Pass fraction of the recent graded window, 0 when empty
    pub success_rate: f64,
    /// Pass (1) / fail (0) flags, most recent first
    pub recent_performance: Vec<u8>,
}

impl PerformanceSnapshot {
    /// Snapshot of a learner with no history at all.
    pub fn new_learner() -> Self {
        Self {
            skill_level_hint: DEFAULT_SKILL_LEVEL,
            completed_lessons: 0,
            success_rate: 0.0,
            recent_performance: Vec::new(),
        }
    }

    /// Builds a snapshot from graded outcomes ordered most-recent-first.
    ///
    /// `success_rate` is taken over the first `success_window` outcomes and
    /// `recent_performance` over the first `recent_window`. The two windows
    /// are independent and usually overlap.
    pub fn from_outcomes(
        skill_level_hint: u32,
        completed_lessons: u32,
        outcomes: &[bool],
        success_window: usize,
        recent_window: usize,
    ) -> Self {
        let success_slice = &outcomes[..outcomes.len().min(success_window)];
        let success_rate = if success_slice.is_empty() {
            0.0
        } else {
            success_slice.iter().filter(|&&passed| passed).count() as f64
                / success_slice.len() as f64
        };

        let recent_performance = outcomes
            .iter()
            .take(recent_window)
            .map(|&passed| u8::from(passed))
            .collect();

        Self {
            skill_level_hint: skill_level_hint.max(DEFAULT_SKILL_LEVEL),
            completed_lessons,
            success_rate,
            recent_performance,
        }
    }

    /// Mean of `recent_performance`, 0 when empty
    pub fn recent_average(&self) -> f64 {
        if self.recent_performance.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.recent_performance.iter().map(|&v| f64::from(v)).sum();
        sum / self.recent_performance.len() as f64
    }

    /// Whether rates and outcome flags are inside their documented domain.
    pub fn is_within_domain(&self) -> bool {
        (0.0..=1.0).contains(&self.success_rate)
            && self.recent_performance.iter().all(|&v| v <= 1)
    }
}

impl Default for PerformanceSnapshot {
    fn default() -> Self {
        Self::new_learner()
    }
}

// ==================== Policy Types ====================

/// Coarse bucket that gates every policy field together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Lenient parse of a stored label. Unknown labels map to beginner.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            _ => Self::Beginner,
        }
    }

    /// Complexity level (1..=3) associated with the tier
    pub fn complexity(&self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationDepth {
    Simple,
    Detailed,
    Technical,
}

impl ExplanationDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Detailed => "detailed",
            Self::Technical => "technical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintFrequency {
    High,
    Medium,
    Low,
}

impl HintFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Failed attempts on the current problem before a hint is offered
    pub fn failure_threshold(&self) -> u32 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// Content-shaping parameters derived from a skill score.
///
/// All fields come from the same tier; `for_tier` is the only constructor.
/// Deserializes from its tier alone so stored policies cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PolicyRepr")]
#[serde(rename_all = "camelCase")]
pub struct ContentPolicy {
    difficulty_tier: DifficultyTier,
    explanation_depth: ExplanationDepth,
    hint_frequency: HintFrequency,
    problem_complexity: u8,
}

impl ContentPolicy {
    pub fn for_tier(tier: DifficultyTier) -> Self {
        let (explanation_depth, hint_frequency) = match tier {
            DifficultyTier::Beginner => (ExplanationDepth::Simple, HintFrequency::High),
            DifficultyTier::Intermediate => (ExplanationDepth::Detailed, HintFrequency::Medium),
            DifficultyTier::Advanced => (ExplanationDepth::Technical, HintFrequency::Low),
        };

        Self {
            difficulty_tier: tier,
            explanation_depth,
            hint_frequency,
            problem_complexity: tier.complexity(),
        }
    }

    pub fn difficulty_tier(&self) -> DifficultyTier {
        self.difficulty_tier
    }

    pub fn explanation_depth(&self) -> ExplanationDepth {
        self.explanation_depth
    }

    pub fn hint_frequency(&self) -> HintFrequency {
        self.hint_frequency
    }

    pub fn problem_complexity(&self) -> u8 {
        self.problem_complexity
    }

    /// Whether content of the given complexity may be shown
    pub fn allows(&self, complexity: u8) -> bool {
        complexity <= self.problem_complexity
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyRepr {
    difficulty_tier: DifficultyTier,
}

impl From<PolicyRepr> for ContentPolicy {
    fn from(repr: PolicyRepr) -> Self {
        Self::for_tier(repr.difficulty_tier)
    }
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::for_tier(DifficultyTier::Beginner)
    }
}

/// Where an explanation request originates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionContext {
    Lesson,
    Problem,
    Hint,
}

impl InteractionContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Problem => "problem",
            Self::Hint => "hint",
        }
    }
}

// ==================== Scoring Types ====================

/// The three capped score components and their capped sum
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// min(completed_lessons * 2, 40)
    pub lesson_component: f64,
    /// success_rate * 30
    pub accuracy_component: f64,
    /// mean(recent_performance) * 30
    pub trend_component: f64,
    /// min(sum, 100)
    pub total: f64,
}
