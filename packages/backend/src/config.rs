use std::time::Duration;

use pylearn_algo::{DEFAULT_RECENT_WINDOW, DEFAULT_SUCCESS_WINDOW};

const DEFAULT_DATABASE_URL: &str = "sqlite:pylearn.db?mode=rwc";
const DEFAULT_PYTHON_BIN: &str = "python3";
const DEFAULT_SANDBOX_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub python_bin: String,
    pub timeout: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python_bin: DEFAULT_PYTHON_BIN.to_string(),
            timeout: Duration::from_millis(DEFAULT_SANDBOX_TIMEOUT_MS),
        }
    }
}

/// Optional OpenAI-compatible backend for tutor replies.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

impl LlmSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && !self.model.trim().is_empty()
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            api_endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_LLM_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub database_url: String,
    pub sandbox: SandboxConfig,
    pub success_window: usize,
    pub recent_window: usize,
    pub llm: LlmSettings,
}

impl Config {
    /// Loads `.env` (if present) and then reads the environment.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Invalid or missing values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_level = get("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let python_bin = get("PYTHON_BIN").unwrap_or_else(|| DEFAULT_PYTHON_BIN.to_string());
        let timeout_ms = get("SANDBOX_TIMEOUT_MS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|&ms| ms > 0)
            .unwrap_or(DEFAULT_SANDBOX_TIMEOUT_MS);

        let success_window = get("SUCCESS_WINDOW")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_SUCCESS_WINDOW);
        let recent_window = get("RECENT_WINDOW")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_RECENT_WINDOW);

        let llm = LlmSettings {
            api_key: get("LLM_API_KEY"),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            api_endpoint: get("LLM_API_ENDPOINT")
                .or_else(|| get("LLM_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_LLM_ENDPOINT.to_string()),
            timeout: Duration::from_millis(
                get("LLM_TIMEOUT")
                    .and_then(|value| value.trim().parse::<u64>().ok())
                    .filter(|&ms| ms > 0)
                    .unwrap_or(DEFAULT_LLM_TIMEOUT_MS),
            ),
        };

        Self {
            log_level,
            database_url,
            sandbox: SandboxConfig {
                python_bin,
                timeout: Duration::from_millis(timeout_ms),
            },
            success_window,
            recent_window,
            llm,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
