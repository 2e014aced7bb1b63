//! # pylearn-algo - adaptive-difficulty engine
//!
//! Pure, stateless functions that turn a learner's performance history into a
//! skill score and a content policy:
//!
//! - [`scoring`] - skill score (lesson volume, accuracy, recent trend)
//! - [`policy`] - tier bucketing and hint timing
//! - [`prompt`] - explanation request strings for a text generator
//! - [`gating`] - filtering lessons and problems by policy
//! - [`batch`] - parallel scoring of many learners
//! - [`types`] - shared types and constants
//!
//! Nothing here performs I/O or holds state, so every function may be called
//! concurrently from any number of sessions.
//!
//! ## Example
//!
//! ```rust
//! use pylearn_algo::{compute_skill_score, derive_policy, should_surface_hint, PerformanceSnapshot};
//!
//! let snapshot = PerformanceSnapshot::from_outcomes(1, 10, &[true, false, true, false], 10, 10);
//! let score = compute_skill_score(&snapshot);
//! let policy = derive_policy(score);
//!
//! assert_eq!(score, 50.0);
//! assert!(!should_surface_hint(1, &policy));
//! assert!(should_surface_hint(2, &policy));
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod batch;
pub mod gating;
pub mod policy;
pub mod prompt;
pub mod scoring;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use batch::{batch_score, score_and_derive, ScoredPolicy};
pub use gating::{complexity_of_label, filter_visible, Gated};
pub use policy::{derive_policy, should_surface_hint, tier_for_score};
pub use prompt::build_explanation_prompt;
pub use scoring::{compute_skill_score, score_breakdown};
