/// LLM Client — answer synthesis for the journal chat.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Callers depend on the `AnswerSynthesizer` trait; `LlmClient` is its production backend.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
/// The model behind every synthesized answer.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Chat answers are short; this caps a runaway reply.
const MAX_ANSWER_TOKENS: u32 = 1024;
const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Produces the final answer text for a grounded prompt.
///
/// Carried in `AppState` as `Option<Arc<dyn AnswerSynthesizer>>`; `None` means the
/// service has no synthesis credentials.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ResponseBlock>,
    pub usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl MessagesResponse {
    /// Text of the first text block; blank text counts as none.
    pub fn answer_text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|b| b.kind == "text")
            .find_map(|b| b.text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Retry policy
// ────────────────────────────────────────────────────────────────────────────

/// Rate limiting and server-side failures are worth another attempt.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before attempt `attempt` (0-based): none, then 1s, 2s, 4s...
fn backoff_delay(attempt: u32) -> Duration {
    match attempt {
        0 => Duration::ZERO,
        n => Duration::from_secs(1 << (n - 1)),
    }
}

/// The API's own error message when the body carries one, otherwise the raw body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Error reported once every attempt has failed. A trailing 429 means rate limiting.
fn exhausted(last_error: Option<LlmError>) -> LlmError {
    match last_error {
        None
        | Some(LlmError::Api {
            status: 429,
            ..
        }) => LlmError::RateLimited {
            retries: MAX_ATTEMPTS,
        },
        Some(e) => e,
    }
}

enum AttemptError {
    Retry(LlmError),
    Fatal(LlmError),
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, api_key })
    }

    /// One Messages API exchange, retried on transport errors, 429 and 5xx.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<MessagesResponse, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_ANSWER_TOKENS,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error = None;
        for attempt in 0..MAX_ATTEMPTS {
            let delay = backoff_delay(attempt);
            if !delay.is_zero() {
                warn!("Retrying synthesis in {}ms (attempt {})", delay.as_millis(), attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&body).await {
                Ok(response) => return Ok(response),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retry(e)) => {
                    warn!("Synthesis attempt {} failed: {e}", attempt + 1);
                    last_error = Some(e);
                }
            }
        }

        Err(exhausted(last_error))
    }

    async fn send_once(
        &self,
        body: &MessagesRequest<'_>,
    ) -> Result<MessagesResponse, AttemptError> {
        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::Retry(LlmError::Http(e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AttemptError::Retry(LlmError::Http(e)))?;

        if !status.is_success() {
            let err = LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(text),
            };
            return Err(if is_retryable(status) {
                AttemptError::Retry(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| AttemptError::Fatal(LlmError::Parse(e)))?;
        debug!(
            "Synthesis usage: input_tokens={}, output_tokens={}",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );
        Ok(parsed)
    }
}

#[async_trait]
impl AnswerSynthesizer for LlmClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let response = self.complete(system, prompt).await?;
        response
            .answer_text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff_delay(0), Duration::ZERO);
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_final_429_is_rate_limited() {
        let err = exhausted(Some(LlmError::Api {
            status: 429,
            message: "slow down".to_string(),
        }));
        assert!(matches!(err, LlmError::RateLimited { retries: 3 }));
    }

    #[test]
    fn test_final_5xx_is_kept() {
        let err = exhausted(Some(LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        }));
        assert!(matches!(err, LlmError::Api { status: 503, .. }));
    }

    #[test]
    fn test_api_error_message_prefers_envelope() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad"}}"#;
        assert_eq!(api_error_message(body.to_string()), "bad");
        assert_eq!(api_error_message("gateway down".to_string()), "gateway down");
    }

    #[test]
    fn test_answer_text_skips_non_text_blocks() {
        let json = r#"{
            "content": [
                {"type": "tool_use"},
                {"type": "text", "text": "Fuiste a la playa."}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.answer_text(), Some("Fuiste a la playa."));
    }

    #[test]
    fn test_blank_answer_is_none() {
        let json = r#"{
            "content": [{"type": "text", "text": "  "}],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert!(response.answer_text().is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_ANSWER_TOKENS,
            system: "sys",
            messages: [Message {
                role: "user",
                content: "hola",
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], MODEL);
        assert_eq!(value["max_tokens"], 1024);
        assert_eq!(value["system"], "sys");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hola");
    }
}
