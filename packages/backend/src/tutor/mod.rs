//! Conversational tutor.
//!
//! A [`TutorSession`] owns the chat history for one learner in one lesson or
//! practice problem. Replies that need free text come from a
//! [`TextGenerator`]: [`LlmGenerator`] when a completion endpoint is
//! configured, [`ScriptedTutor`] otherwise.

pub mod llm;
pub mod scripted;
pub mod session;

use async_trait::async_trait;
use thiserror::Error;

use pylearn_algo::{ContentPolicy, DifficultyTier, ExplanationDepth, InteractionContext};

pub use llm::LlmGenerator;
pub use scripted::ScriptedTutor;
pub use session::{QuickAction, TutorSession};

/// Marks where the learner's own words start inside a tutor prompt.
pub const QUESTION_MARKER: &str = "Learner question: ";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyChoices,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// What the learner is looking at while talking to the tutor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorContext {
    Lesson { content: String },
    Practice { content: String, user_code: Option<String> },
}

impl TutorContext {
    pub fn interaction(&self) -> InteractionContext {
        match self {
            Self::Lesson { .. } => InteractionContext::Lesson,
            Self::Practice { .. } => InteractionContext::Problem,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Lesson { content } | Self::Practice { content, .. } => content,
        }
    }

    pub fn user_code(&self) -> Option<&str> {
        match self {
            Self::Practice { user_code: Some(code), .. } if !code.trim().is_empty() => Some(code),
            _ => None,
        }
    }
}

/// Prompt for a free-form question, shaped by the learner's tier.
pub fn tutor_prompt(context: &TutorContext, policy: &ContentPolicy, question: &str) -> String {
    let style = match policy.explanation_depth() {
        ExplanationDepth::Simple => "Use very simple terms and short steps.",
        ExplanationDepth::Detailed => "Give a detailed answer with a small example.",
        ExplanationDepth::Technical => "Be technical and precise; mention trade-offs where relevant.",
    };
    let level = match policy.difficulty_tier() {
        DifficultyTier::Beginner => "a beginner",
        DifficultyTier::Intermediate => "an intermediate",
        DifficultyTier::Advanced => "an advanced",
    };

    let mut prompt = format!("You are a Python tutor helping {level} learner. {style}\n\n");
    match context {
        TutorContext::Lesson { content } => {
            prompt.push_str("Current lesson:\n");
            prompt.push_str(content);
        }
        TutorContext::Practice { content, .. } => {
            prompt.push_str("Current problem:\n");
            prompt.push_str(content);
            if let Some(code) = context.user_code() {
                prompt.push_str("\n\nLearner's code:\n```python\n");
                prompt.push_str(code);
                prompt.push_str("\n```");
            }
        }
    }
    prompt.push_str("\n\n");
    prompt.push_str(QUESTION_MARKER);
    prompt.push_str(question);
    prompt
}
