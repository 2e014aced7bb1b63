use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use pylearn_algo::{build_explanation_prompt, ContentPolicy, DifficultyTier, InteractionContext};

use super::{tutor_prompt, TextGenerator, TutorContext};
use crate::store::{ChatMessage, PerformanceStore};

const APOLOGY: &str = "I'm sorry, I'm having trouble responding right now. Please try again in a moment.";

/// A canned message the learner can send with one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub label: &'static str,
    pub message: &'static str,
}

const PRACTICE_ACTIONS: [QuickAction; 3] = [
    QuickAction { label: "Give me a hint", message: "Can you give me a hint for this problem?" },
    QuickAction { label: "Explain my code", message: "Can you explain what my code is doing?" },
    QuickAction { label: "Why is this wrong?", message: "Why is my code not working?" },
];

const LESSON_ACTIONS: [QuickAction; 3] = [
    QuickAction { label: "Explain this better", message: "Can you explain this concept in simpler terms?" },
    QuickAction { label: "Give me an example", message: "Can you give me a practical example?" },
    QuickAction { label: "What's next?", message: "What should I learn next?" },
];

pub fn welcome_message(tier: DifficultyTier) -> &'static str {
    match tier {
        DifficultyTier::Beginner => "Hi! I'm here to help you learn Python step by step. Don't worry if things seem confusing at first - we'll take it slow and I'll explain everything clearly!",
        DifficultyTier::Intermediate => "Hello! I'm your AI tutor. I can see you're making good progress with Python. I'm here to help you tackle more challenging concepts and improve your coding skills.",
        DifficultyTier::Advanced => "Greetings! I can see you're quite experienced with Python. I'm here to help you with advanced concepts, optimization techniques, and complex problem-solving.",
    }
}

fn practice_hint(tier: DifficultyTier) -> &'static str {
    match tier {
        DifficultyTier::Beginner => "Here's a gentle hint: Look at your variable names and make sure they match what the problem is asking for. Try running your code step by step in your mind.",
        DifficultyTier::Intermediate => "Hint: Consider the logic flow of your code. Are you handling all the edge cases? Check your conditional statements and loops.",
        DifficultyTier::Advanced => "Hint: Think about the algorithm's efficiency and edge cases. Consider if there's a more elegant or optimized approach to solve this problem.",
    }
}

fn code_explanation(tier: DifficultyTier) -> &'static str {
    match tier {
        DifficultyTier::Beginner => "Let me explain your code line by line in simple terms...",
        DifficultyTier::Intermediate => "Here's what your code is doing and how it could be improved...",
        DifficultyTier::Advanced => "Let's analyze your code's structure, efficiency, and potential optimizations...",
    }
}

enum Route {
    Canned(&'static str),
    Generate(String),
}

pub struct TutorSession {
    user_id: String,
    context: TutorContext,
    policy: ContentPolicy,
    messages: Vec<ChatMessage>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn PerformanceStore>,
}

impl TutorSession {
    /// Fresh conversation opening with the tier's welcome message.
    pub fn new(
        user_id: impl Into<String>,
        context: TutorContext,
        policy: ContentPolicy,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn PerformanceStore>,
    ) -> Self {
        let welcome = ChatMessage::assistant(welcome_message(policy.difficulty_tier()));
        Self {
            user_id: user_id.into(),
            context,
            policy,
            messages: vec![welcome],
            generator,
            store,
        }
    }

    /// Continues the learner's saved conversation, or starts a fresh one.
    pub async fn resume(
        user_id: impl Into<String>,
        context: TutorContext,
        policy: ContentPolicy,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn PerformanceStore>,
    ) -> Self {
        let mut session = Self::new(user_id, context, policy, generator, store);
        match session.store.conversation(&session.user_id).await {
            Ok(history) if !history.is_empty() => session.messages = history,
            Ok(_) => {}
            Err(err) => warn!(user_id = %session.user_id, error = %err, "failed to load conversation"),
        }
        session
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn welcome(&self) -> &'static str {
        welcome_message(self.policy.difficulty_tier())
    }

    pub fn quick_actions(&self) -> &'static [QuickAction] {
        match self.context {
            TutorContext::Lesson { .. } => &LESSON_ACTIONS,
            TutorContext::Practice { .. } => &PRACTICE_ACTIONS,
        }
    }

    /// Updates the code the learner is currently editing.
    pub fn set_user_code(&mut self, code: impl Into<String>) {
        if let TutorContext::Practice { user_code, .. } = &mut self.context {
            *user_code = Some(code.into());
        }
    }

    fn route(&self, message: &str) -> Route {
        let lowered = message.to_lowercase();
        let tier = self.policy.difficulty_tier();

        if self.context.user_code().is_some() {
            if lowered.contains("hint") || lowered.contains("help") {
                return Route::Canned(practice_hint(tier));
            }
            if lowered.contains("explain") || lowered.contains("why") {
                return Route::Canned(code_explanation(tier));
            }
        }

        if let TutorContext::Lesson { content } = &self.context {
            if lowered.contains("explain") || lowered.contains("understand") {
                return Route::Generate(build_explanation_prompt(content, &self.policy, InteractionContext::Lesson));
            }
        }

        Route::Generate(tutor_prompt(&self.context, &self.policy, message))
    }

    /// Sends a learner message and returns the tutor's reply. Blank messages
    /// are ignored.
    pub async fn ask(&mut self, message: &str) -> Option<&ChatMessage> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(message));

        let reply = match self.route(message) {
            Route::Canned(text) => Ok(text.to_string()),
            Route::Generate(prompt) => self.generator.generate(&prompt).await,
        };

        match reply {
            Ok(text) => {
                self.messages.push(ChatMessage::assistant(text));
                if let Err(err) = self.store.save_conversation(&self.user_id, &self.messages).await {
                    warn!(user_id = %self.user_id, error = %err, "failed to save conversation");
                }
                debug!(user_id = %self.user_id, messages = self.messages.len(), "tutor replied");
            }
            Err(err) => {
                warn!(user_id = %self.user_id, error = %err, "tutor reply failed");
                self.messages.push(ChatMessage::assistant(APOLOGY));
            }
        }

        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChatRole, MemoryStore};
    use crate::tutor::{GenerationError, ScriptedTutor};
    use async_trait::async_trait;

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyChoices)
        }
    }

    fn practice(code: Option<&str>) -> TutorContext {
        TutorContext::Practice {
            content: "Reverse a string".to_string(),
            user_code: code.map(str::to_string),
        }
    }

    fn session(context: TutorContext, tier: DifficultyTier, store: Arc<MemoryStore>) -> TutorSession {
        let policy = ContentPolicy::for_tier(tier);
        TutorSession::new("u1", context, policy, Arc::new(ScriptedTutor::new(policy)), store)
    }

    #[tokio::test]
    async fn test_starts_with_welcome() {
        let tutor = session(practice(None), DifficultyTier::Advanced, Arc::new(MemoryStore::new()));
        assert_eq!(tutor.messages().len(), 1);
        assert_eq!(tutor.messages()[0].role, ChatRole::Assistant);
        assert_eq!(tutor.messages()[0].content, tutor.welcome());
        assert!(tutor.welcome().starts_with("Greetings!"));
    }

    #[tokio::test]
    async fn test_hint_keyword_with_code() {
        let store = Arc::new(MemoryStore::new());
        let mut tutor = session(practice(Some("def rev(s): return s")), DifficultyTier::Intermediate, Arc::clone(&store));
        let reply = tutor.ask("Can you give me a hint?").await.unwrap().content.clone();
        assert_eq!(reply, practice_hint(DifficultyTier::Intermediate));

        let saved = store.conversation("u1").await.unwrap();
        assert_eq!(saved.len(), 3);
    }

    #[tokio::test]
    async fn test_keywords_need_code() {
        let mut tutor = session(practice(None), DifficultyTier::Beginner, Arc::new(MemoryStore::new()));
        let reply = tutor.ask("help").await.unwrap().content.clone();
        assert!(reply.contains("Regarding your question: \"help\""));

        tutor.set_user_code("def rev(s):\n    return s[::-1]");
        let reply = tutor.ask("why does this work?").await.unwrap().content.clone();
        assert_eq!(reply, code_explanation(DifficultyTier::Beginner));
    }

    #[tokio::test]
    async fn test_lesson_explain_uses_explanation_prompt() {
        let context = TutorContext::Lesson { content: "for loops".to_string() };
        let mut tutor = session(context, DifficultyTier::Intermediate, Arc::new(MemoryStore::new()));
        let reply = tutor.ask("I don't understand").await.unwrap().content.clone();
        assert_eq!(reply, "Provide a detailed explanation of this Python concept with examples: for loops");
    }

    #[tokio::test]
    async fn test_generation_failure_appends_apology() {
        let store = Arc::new(MemoryStore::new());
        let policy = ContentPolicy::default();
        let context = TutorContext::Lesson { content: "x".to_string() };
        let mut tutor = TutorSession::new("u1", context, policy, Arc::new(FailingGenerator), Arc::clone(&store) as Arc<dyn PerformanceStore>);

        let reply = tutor.ask("what next?").await.unwrap().content.clone();
        assert_eq!(reply, APOLOGY);
        assert_eq!(tutor.messages().len(), 3);
        assert!(store.conversation("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_ignored() {
        let mut tutor = session(practice(None), DifficultyTier::Beginner, Arc::new(MemoryStore::new()));
        assert!(tutor.ask("   ").await.is_none());
        assert_eq!(tutor.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_loads_history() {
        let store = Arc::new(MemoryStore::new());
        let mut first = session(practice(Some("x = 1")), DifficultyTier::Beginner, Arc::clone(&store));
        first.ask("hint please").await;

        let policy = ContentPolicy::default();
        let resumed = TutorSession::resume("u1", practice(None), policy, Arc::new(ScriptedTutor::new(policy)), store).await;
        assert_eq!(resumed.messages().len(), 3);
        assert_eq!(resumed.quick_actions()[0].label, "Give me a hint");
    }
}
