//! Code-execution sandbox.
//!
//! [`SandboxHandle`] owns a lazily constructed sandbox. The first caller runs
//! the loader; concurrent callers wait on the same initialization instead of
//! starting another one. A failed load is not cached.

pub mod python;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{error, info};

pub use python::{PythonLoader, PythonSandbox};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub stdout: String,
    /// Formatted exception, if the code raised
    pub error: Option<String>,
}

impl ExecutionOutput {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Folds sandbox failures into `error` so they read as a failed run.
    pub fn from_result(result: Result<ExecutionOutput, SandboxError>) -> Self {
        match result {
            Ok(output) => output,
            Err(SandboxError::Exception { message, stdout }) => Self {
                stdout,
                error: Some(message),
            },
            Err(err) => Self {
                stdout: String::new(),
                error: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub value: Value,
    pub stdout: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("interpreter unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),
    #[error("{message}")]
    Exception { message: String, stdout: String },
    #[error("result decode failed: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Runs a script, capturing stdout and any raised exception.
    async fn run(&self, code: &str) -> Result<ExecutionOutput, SandboxError>;

    /// Executes `source`, then calls `function` with positional `args`.
    async fn call(&self, source: &str, function: &str, args: &[Value]) -> Result<CallOutcome, SandboxError>;
}

#[async_trait]
pub trait SandboxLoader: Send + Sync {
    type Output: Sandbox + 'static;

    async fn load(&self) -> Result<Self::Output, SandboxError>;
}

pub struct SandboxHandle<L: SandboxLoader> {
    loader: L,
    instance: OnceCell<Arc<L::Output>>,
}

impl<L: SandboxLoader> SandboxHandle<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            instance: OnceCell::new(),
        }
    }

    /// The sandbox, loading it on first use.
    pub async fn get(&self) -> Result<Arc<L::Output>, SandboxError> {
        let instance = self
            .instance
            .get_or_try_init(|| async {
                info!("loading sandbox");
                let started = Instant::now();
                match self.loader.load().await {
                    Ok(sandbox) => {
                        info!(elapsed_ms = started.elapsed().as_millis() as u64, "sandbox loaded");
                        Ok(Arc::new(sandbox))
                    }
                    Err(err) => {
                        error!(error = %err, "failed to load sandbox");
                        Err(err)
                    }
                }
            })
            .await?;
        Ok(Arc::clone(instance))
    }

    /// Already-loaded sandbox, without triggering a load.
    pub fn loaded(&self) -> Option<Arc<L::Output>> {
        self.instance.get().cloned()
    }

    /// Like [`Sandbox::run`], but folds load and spawn failures into the
    /// output's `error` so a caller can show them as a failed run.
    pub async fn run_capturing(&self, code: &str) -> ExecutionOutput {
        ExecutionOutput::from_result(self.run(code).await)
    }
}

#[async_trait]
impl<L: SandboxLoader> Sandbox for SandboxHandle<L> {
    async fn run(&self, code: &str) -> Result<ExecutionOutput, SandboxError> {
        self.get().await?.run(code).await
    }

    async fn call(&self, source: &str, function: &str, args: &[Value]) -> Result<CallOutcome, SandboxError> {
        self.get().await?.call(source, function, args).await
    }
}
