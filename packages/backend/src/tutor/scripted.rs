use async_trait::async_trait;

use pylearn_algo::{ContentPolicy, DifficultyTier};

use super::{GenerationError, TextGenerator, QUESTION_MARKER};

const BEGINNER_OPENERS: [&str; 3] = [
    "Great question! Let me break this down into simple steps for you...",
    "Don't worry, this is a common question for beginners. Here's how to think about it...",
    "Let's start with the basics and build up from there...",
];

const INTERMEDIATE_OPENERS: [&str; 3] = [
    "That's a good question that shows you're thinking deeper about Python...",
    "Here's a more detailed explanation that should help clarify things...",
    "Let me show you a practical example of how this works...",
];

const ADVANCED_OPENERS: [&str; 3] = [
    "Excellent question! This touches on some advanced Python concepts...",
    "Here's the technical explanation and some optimization considerations...",
    "Let's explore the underlying mechanisms and best practices...",
];

/// Offline generator with canned, tier-flavoured replies.
///
/// Tutor prompts get an opener plus an echo of the learner's question.
/// Any other prompt (an explanation request) is returned as is.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedTutor {
    policy: ContentPolicy,
}

impl ScriptedTutor {
    pub fn new(policy: ContentPolicy) -> Self {
        Self { policy }
    }

    fn opener(&self, question: &str) -> &'static str {
        let openers = match self.policy.difficulty_tier() {
            DifficultyTier::Beginner => &BEGINNER_OPENERS,
            DifficultyTier::Intermediate => &INTERMEDIATE_OPENERS,
            DifficultyTier::Advanced => &ADVANCED_OPENERS,
        };
        // Same question, same opener.
        let seed = question.bytes().fold(0usize, |acc, b| acc.wrapping_add(usize::from(b)));
        openers[seed % openers.len()]
    }
}

#[async_trait]
impl TextGenerator for ScriptedTutor {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let Some((_, question)) = prompt.rsplit_once(QUESTION_MARKER) else {
            return Ok(prompt.to_string());
        };
        Ok(format!(
            "{}\n\nRegarding your question: \"{question}\"\n\nI'd be happy to help you understand this better. Could you be more specific about what part you'd like me to explain?",
            self.opener(question)
        ))
    }
}
