//! Explanation prompts for the text-generation collaborator.
//!
//! Formatting only; nothing here calls out to a generation service.

use crate::types::{ContentPolicy, ExplanationDepth, InteractionContext};

/// Request string for an explanation of `subject_matter` at the policy's depth.
///
/// The wording depends only on the explanation depth and the subject matter.
/// `context` tags where the request comes from and does not change the text.
pub fn build_explanation_prompt(
    subject_matter: &str,
    policy: &ContentPolicy,
    _context: InteractionContext,
) -> String {
    match policy.explanation_depth() {
        ExplanationDepth::Simple => format!(
            "Explain this Python concept in very simple terms, like you're teaching a complete beginner: {subject_matter}"
        ),
        ExplanationDepth::Detailed => format!(
            "Provide a detailed explanation of this Python concept with examples: {subject_matter}"
        ),
        ExplanationDepth::Technical => format!(
            "Give a technical, comprehensive explanation of this Python concept: {subject_matter}"
        ),
    }
}
