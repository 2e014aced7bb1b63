use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::sandbox::{PythonLoader, Sandbox, SandboxHandle};
use crate::services::catalog;
use crate::services::dashboard::{summarize, DashboardSummary};
use crate::services::practice::PracticeSession;
use crate::services::snapshot::{LearnerStanding, SnapshotAssembler};
use crate::store::{Lesson, MemoryStore, PerformanceStore, PracticeProblem, SqliteStore, StoreError};
use crate::tutor::{LlmGenerator, ScriptedTutor, TextGenerator, TutorContext, TutorSession};

/// Switches that can be flipped while the process runs.
#[derive(Debug)]
pub struct RuntimeFlags {
    llm_enabled: AtomicBool,
}

impl RuntimeFlags {
    pub fn new() -> Self {
        Self {
            llm_enabled: AtomicBool::new(true),
        }
    }

    pub fn is_llm_enabled(&self) -> bool {
        self.llm_enabled.load(Ordering::Relaxed)
    }

    pub fn set_llm_enabled(&self, enabled: bool) {
        self.llm_enabled.store(enabled, Ordering::Relaxed);
    }
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn PerformanceStore>,
    sandbox: Arc<dyn Sandbox>,
    llm: Option<Arc<LlmGenerator>>,
    runtime: Arc<RuntimeFlags>,
    assembler: SnapshotAssembler,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn PerformanceStore>,
        sandbox: Arc<dyn Sandbox>,
        llm: Option<LlmGenerator>,
    ) -> Self {
        Self {
            assembler: SnapshotAssembler::from_config(&config),
            config: Arc::new(config),
            store,
            sandbox,
            llm: llm.filter(LlmGenerator::is_available).map(Arc::new),
            runtime: Arc::new(RuntimeFlags::new()),
        }
    }

    /// Wires the SQLite store, the Python sandbox and, when configured, the
    /// completion backend. An unreachable database degrades to an in-memory
    /// store.
    pub async fn from_config(config: Config) -> Self {
        let store: Arc<dyn PerformanceStore> = match SqliteStore::connect(&config.database_url).await {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!(error = %err, url = %config.database_url, "sqlite unavailable, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        let sandbox = Arc::new(SandboxHandle::new(PythonLoader::from_config(&config.sandbox)));

        let llm = config
            .llm
            .is_configured()
            .then(|| LlmGenerator::new(config.llm.clone()));
        info!(llm = llm.is_some(), "application state ready");

        Self::new(config, store, sandbox, llm)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn PerformanceStore> {
        Arc::clone(&self.store)
    }

    pub fn sandbox(&self) -> Arc<dyn Sandbox> {
        Arc::clone(&self.sandbox)
    }

    pub fn runtime(&self) -> Arc<RuntimeFlags> {
        Arc::clone(&self.runtime)
    }

    pub async fn standing(&self, user_id: &str) -> LearnerStanding {
        self.assembler.standing(self.store.as_ref(), user_id).await
    }

    pub async fn dashboard(&self, user_id: &str) -> DashboardSummary {
        summarize(&self.standing(user_id).await)
    }

    pub async fn visible_lessons(&self, user_id: &str) -> Result<Vec<Lesson>, StoreError> {
        let standing = self.standing(user_id).await;
        catalog::visible_lessons(self.store.as_ref(), &standing.policy).await
    }

    pub async fn visible_problems(&self, user_id: &str) -> Result<Vec<PracticeProblem>, StoreError> {
        let standing = self.standing(user_id).await;
        catalog::visible_problems(self.store.as_ref(), &standing.policy).await
    }

    /// Marks the lesson complete and returns the learner's updated standing.
    pub async fn complete_lesson(&self, user_id: &str, lesson_id: &str) -> Result<LearnerStanding, StoreError> {
        self.store.mark_lesson_complete(user_id, lesson_id).await?;
        Ok(self.standing(user_id).await)
    }

    pub async fn start_practice(&self, user_id: &str, problem_id: &str) -> Result<PracticeSession, StoreError> {
        let problem = self
            .store
            .problems()
            .await?
            .into_iter()
            .find(|p| p.id == problem_id)
            .ok_or_else(|| StoreError::NotFound(format!("problem {problem_id}")))?;

        let standing = self.standing(user_id).await;
        Ok(PracticeSession::new(
            user_id,
            problem,
            standing.policy,
            Arc::clone(&self.store),
            Arc::clone(&self.sandbox),
        ))
    }

    pub async fn start_tutor(&self, user_id: &str, context: TutorContext) -> TutorSession {
        let policy = self.standing(user_id).await.policy;
        let generator: Arc<dyn TextGenerator> = match &self.llm {
            Some(llm) if self.runtime.is_llm_enabled() => Arc::clone(llm) as Arc<dyn TextGenerator>,
            _ => Arc::new(ScriptedTutor::new(policy)),
        };
        TutorSession::resume(user_id, context, policy, generator, Arc::clone(&self.store)).await
    }

    pub fn llm_active(&self) -> bool {
        self.llm.is_some() && self.runtime.is_llm_enabled()
    }
}
