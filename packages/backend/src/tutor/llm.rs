use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, warn};

use super::{GenerationError, TextGenerator};
use crate::config::LlmSettings;

const MAX_RETRIES: usize = 3;
const BASE_BACKOFF_MS: u64 = 200;

const SYSTEM_PROMPT: &str = "You are a patient Python programming tutor. Answer the learner's question \
directly, keep code examples short and runnable, and never hand out full solutions to practice problems.";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: WireMessage,
}

/// OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct LlmGenerator {
    settings: LlmSettings,
    client: reqwest::Client,
}

impl LlmGenerator {
    pub fn new(settings: LlmSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let settings = LlmSettings {
            api_endpoint: normalize_endpoint(&settings.api_endpoint),
            ..settings
        };
        Self { settings, client }
    }

    pub fn is_available(&self) -> bool {
        self.settings.api_key.as_deref().is_some_and(|v| !v.trim().is_empty())
            && !self.settings.model.trim().is_empty()
            && !self.settings.api_endpoint.trim().is_empty()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.settings.api_endpoint)
    }

    async fn post_with_retry(
        &self,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<CompletionResponse, GenerationError> {
        let url = self.completions_url();
        let mut last_error: Option<GenerationError> = None;

        for retry in 0..=MAX_RETRIES {
            match self.client.post(&url).bearer_auth(api_key).json(payload).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let bytes = resp.bytes().await?;
                        return serde_json::from_slice(&bytes).map_err(|e| {
                            error!(error = %e, body = %String::from_utf8_lossy(&bytes), "unparseable completion response");
                            GenerationError::Json(e)
                        });
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = GenerationError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        warn!(retry, ?status, "completion request failed, retrying");
                        sleep(backoff(retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    if retry < MAX_RETRIES {
                        warn!(retry, error = %e, "completion request error, retrying");
                        sleep(backoff(retry)).await;
                        last_error = Some(GenerationError::Request(e));
                        continue;
                    }
                    return Err(GenerationError::Request(e));
                }
            }
        }
        Err(last_error.unwrap_or(GenerationError::EmptyChoices))
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(GenerationError::NotConfigured("LLM_API_KEY"))?;

        let messages = [
            WireMessage { role: "system".into(), content: SYSTEM_PROMPT.into() },
            WireMessage { role: "user".into(), content: prompt.into() },
        ];
        let payload = serde_json::json!({
            "model": self.settings.model,
            "messages": messages,
            "stream": false
        });

        let response = self.post_with_retry(api_key, &payload).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyChoices)
    }
}

/// Exponential backoff with up to one base interval of jitter.
fn backoff(retry: usize) -> Duration {
    let jitter = rand::rng().random_range(0..BASE_BACKOFF_MS);
    Duration::from_millis(BASE_BACKOFF_MS * (1 << retry) + jitter)
}

fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") || trimmed.contains("/v1/") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>, endpoint: &str) -> LlmSettings {
        LlmSettings {
            api_key: api_key.map(str::to_string),
            api_endpoint: endpoint.to_string(),
            ..LlmSettings::default()
        }
    }

    #[test]
    fn test_endpoint_normalization() {
        assert_eq!(normalize_endpoint("https://api.example.com"), "https://api.example.com/v1");
        assert_eq!(normalize_endpoint("https://api.example.com/v1/"), "https://api.example.com/v1");
        assert_eq!(
            LlmGenerator::new(settings(Some("k"), "http://localhost:8080")).completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_availability_needs_key() {
        assert!(!LlmGenerator::new(settings(None, "http://localhost")).is_available());
        assert!(!LlmGenerator::new(settings(Some("  "), "http://localhost")).is_available());
        assert!(LlmGenerator::new(settings(Some("sk-1"), "http://localhost")).is_available());
    }

    #[tokio::test]
    async fn test_generate_without_key_is_not_configured() {
        let generator = LlmGenerator::new(settings(None, "http://localhost"));
        let err = generator.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured("LLM_API_KEY")));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(reqwest::StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_backoff_grows() {
        assert!(backoff(0) < Duration::from_millis(2 * BASE_BACKOFF_MS));
        assert!(backoff(2) >= Duration::from_millis(4 * BASE_BACKOFF_MS));
    }
}
