use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use pylearn_algo::{build_explanation_prompt, should_surface_hint, ContentPolicy, InteractionContext};

use super::grading::{grade, GradeReport};
use crate::sandbox::{ExecutionOutput, Sandbox};
use crate::store::{NewSubmission, PerformanceStore, PracticeProblem};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptFeedback {
    pub report: GradeReport,
    pub failed_attempts: u32,
    pub show_hint: bool,
}

/// One learner working on one problem.
///
/// The failed-attempt counter lives here and only here; starting a new
/// session is what resets it.
pub struct PracticeSession {
    user_id: String,
    problem: PracticeProblem,
    policy: ContentPolicy,
    failed_attempts: u32,
    store: Arc<dyn PerformanceStore>,
    sandbox: Arc<dyn Sandbox>,
}

impl PracticeSession {
    pub fn new(
        user_id: impl Into<String>,
        problem: PracticeProblem,
        policy: ContentPolicy,
        store: Arc<dyn PerformanceStore>,
        sandbox: Arc<dyn Sandbox>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            problem,
            policy,
            failed_attempts: 0,
            store,
            sandbox,
        }
    }

    pub fn problem(&self) -> &PracticeProblem {
        &self.problem
    }

    pub fn policy(&self) -> &ContentPolicy {
        &self.policy
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn hint_available(&self) -> bool {
        should_surface_hint(self.failed_attempts, &self.policy)
    }

    /// Starter code if the problem has one, otherwise an empty definition of
    /// the expected function.
    pub fn starter_code(&self) -> String {
        match &self.problem.starter_code {
            Some(code) if !code.trim().is_empty() => code.clone(),
            _ => format!("def {}():\n    pass\n", self.problem.function_name),
        }
    }

    /// Grades `code`, records the attempt and updates the failure counter.
    pub async fn submit(&mut self, code: &str) -> AttemptFeedback {
        let report = grade(self.sandbox.as_ref(), &self.problem, code).await;

        if !report.passed {
            self.failed_attempts = self.failed_attempts.saturating_add(1);
        }

        let submission = NewSubmission {
            user_id: self.user_id.clone(),
            problem_id: self.problem.id.clone(),
            code: code.to_string(),
            passed: report.passed,
            result: Some(report.to_json()),
        };
        if let Err(err) = self.store.record_submission(&submission).await {
            warn!(user_id = %self.user_id, problem_id = %self.problem.id, error = %err, "failed to record submission");
        }

        let show_hint = should_surface_hint(self.failed_attempts, &self.policy);
        info!(
            user_id = %self.user_id,
            problem_id = %self.problem.id,
            passed = report.passed,
            failed_attempts = self.failed_attempts,
            show_hint,
            "practice attempt graded"
        );

        AttemptFeedback {
            report,
            failed_attempts: self.failed_attempts,
            show_hint,
        }
    }

    /// Runs code without grading or recording it.
    pub async fn run_scratch(&self, code: &str) -> ExecutionOutput {
        ExecutionOutput::from_result(self.sandbox.run(code).await)
    }

    pub fn hint_prompt(&self) -> String {
        build_explanation_prompt(&self.problem.description, &self.policy, InteractionContext::Hint)
    }
}
