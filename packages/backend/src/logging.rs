use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "pylearn.log";

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    /// Daily-rolling file output in this directory when set
    pub file_dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            file_dir: None,
        }
    }

    /// `ENABLE_FILE_LOGS=true|1` turns on file output under `LOG_DIR` (default `./logs`).
    pub fn from_env(level: impl Into<String>) -> Self {
        let enabled = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let file_dir = enabled.then(|| {
            PathBuf::from(std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()))
        });

        Self {
            level: level.into(),
            file_dir,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Keeps the non-blocking file writer flushing; hold it for the process lifetime.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("global subscriber already installed")]
    AlreadyInitialized,
}

/// Installs the global subscriber: stdout always, plus a rolling file when
/// `settings.file_dir` is set.
pub fn init_tracing(settings: &LogSettings) -> Result<Option<FileLogGuard>, LoggingError> {
    let stdout_layer = fmt::layer().with_target(true);

    let Some(dir) = settings.file_dir.as_ref() else {
        tracing_subscriber::registry()
            .with(settings.filter())
            .with(stdout_layer)
            .try_init()
            .map_err(|_| LoggingError::AlreadyInitialized)?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir).map_err(|source| LoggingError::LogDir {
        path: dir.clone(),
        source,
    })?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(settings.filter())
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(Some(FileLogGuard { _guard: guard }))
}
