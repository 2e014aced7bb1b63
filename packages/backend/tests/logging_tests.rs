use tempfile::TempDir;

use pylearn_backend::logging::{init_tracing, LogSettings, LoggingError};

// Installs the global subscriber, so this binary holds a single test.
#[test]
fn test_file_logging_writes_to_log_dir() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let log_dir = temp_dir.path().join("logs");

    let settings = LogSettings {
        level: "info".to_string(),
        file_dir: Some(log_dir.clone()),
    };
    let guard = init_tracing(&settings).expect("first init succeeds");
    assert!(guard.is_some());
    assert!(log_dir.is_dir());

    tracing::info!(learner = "u1", "logging smoke test");
    drop(guard);

    let names: Vec<String> = std::fs::read_dir(&log_dir)
        .expect("log dir readable")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|name| name.starts_with("pylearn.log")), "{names:?}");

    let again = init_tracing(&LogSettings::new("debug"));
    assert!(matches!(again, Err(LoggingError::AlreadyInitialized)));
}
