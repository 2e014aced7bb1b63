//! Content gating
//!
//! Filters lessons and problems by the complexity the current policy allows.

use crate::types::{ContentPolicy, DifficultyTier};

/// Anything whose visibility is gated by a content policy
pub trait Gated {
    /// Complexity level in 1..=3
    fn complexity(&self) -> u8;
}

/// Complexity of a stored difficulty label. Missing or unknown labels are
/// treated as beginner content.
pub fn complexity_of_label(label: Option<&str>) -> u8 {
    label.map(DifficultyTier::parse).unwrap_or(DifficultyTier::Beginner).complexity()
}

/// Items the policy allows, in input order.
pub fn filter_visible<'a, T: Gated>(items: &'a [T], policy: &ContentPolicy) -> Vec<&'a T> {
    items.iter().filter(|item| policy.allows(item.complexity())).collect()
}
