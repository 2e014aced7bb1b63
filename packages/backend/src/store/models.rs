use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pylearn_algo::{complexity_of_label, Gated};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub code_example: Option<String>,
    /// Free-text label, e.g. "beginner"
    pub difficulty: Option<String>,
    pub order_number: i32,
}

impl Gated for Lesson {
    fn complexity(&self) -> u8 {
        complexity_of_label(self.difficulty.as_deref())
    }
}

/// One graded call: positional arguments and the expected return value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Vec<Value>,
    pub expected: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeProblem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Option<String>,
    pub order_number: i32,
    pub starter_code: Option<String>,
    /// Function the learner must define; test cases call it
    pub function_name: String,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl Gated for PracticeProblem {
    fn complexity(&self) -> u8 {
        complexity_of_label(self.difficulty.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub user_id: String,
    pub problem_id: String,
    pub code: String,
    pub passed: bool,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}
