//! OpenRouter-compatible chat-completion client implementing
//! [`CompletionBackend`].
//!
//! Sends one POST per attempt under the shared [`RetryPolicy`]: 401 is
//! terminal (invalid credential, exactly one request), 429 backs off and
//! retries, other non-200 statuses are logged and retried, and a 200 with an
//! unexpected body shape is terminal for the call.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::contract::{ApiError, CompletionBackend};
use crate::retry::{Outcome, RetryPolicy};

const TEMPERATURE: f64 = 0.3;
const TOP_P: f64 = 0.9;
const REFERER: &str = "https://github.com/kasbuunk/readme-forge";
const TITLE: &str = "README Forge";

pub struct CompletionClient {
    http: reqwest::Client,
    api_base_url: String,
    api_key: String,
    model_name: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl CompletionClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;
        info!(
            api_base_url = %config.api_base_url,
            model_name = %config.model_name,
            api_key_set = !config.api_key.is_empty(),
            "Initialized completion client"
        );
        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model_name: config.model_name.clone(),
            max_tokens: config.max_tokens,
            retry: config.retry_policy(),
        })
    }

    /// One POST with status classification; the retry policy drives repeats.
    async fn attempt_complete(&self, system: &str, prompt: &str) -> Outcome<String> {
        let request = ChatRequest {
            model: &self.model_name,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        };

        let url = format!("{}/chat/completions", self.api_base_url);
        let response = match self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Outcome::Retryable(ApiError::Transport(e.to_string())),
        };

        match response.status() {
            StatusCode::OK => match response.json::<ChatResponse>().await {
                Ok(body) => match body.choices.into_iter().next() {
                    Some(choice) => Outcome::Success(choice.message.content.trim().to_string()),
                    None => {
                        error!("Completion response carried no choices");
                        Outcome::Terminal(ApiError::Malformed(
                            "completion response carried no choices".to_string(),
                        ))
                    }
                },
                Err(e) => {
                    error!(error = %e, "Invalid completion response format");
                    Outcome::Terminal(ApiError::Malformed(format!(
                        "invalid completion response: {e}"
                    )))
                }
            },
            StatusCode::UNAUTHORIZED => {
                error!("Invalid API key for completion endpoint");
                Outcome::Terminal(ApiError::Auth)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Completion API rate limit exceeded");
                Outcome::Retryable(ApiError::RateLimited)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                error!(status = %status, body = %body, "Completion API error");
                Outcome::Retryable(ApiError::Transport(format!(
                    "completion API returned status {status}"
                )))
            }
        }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ApiError> {
        debug!(
            model_name = %self.model_name,
            prompt_chars = prompt.len(),
            "Requesting completion"
        );
        let system = system.to_string();
        let prompt = prompt.to_string();
        self.retry
            .run("completion", || {
                let system = system.clone();
                let prompt = prompt.clone();
                async move { self.attempt_complete(&system, &prompt).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn base_url_is_normalised() {
        let config = Config {
            api_base_url: "https://openrouter.ai/api/v1/".to_string(),
            api_key: "key".to_string(),
            ..Config::default()
        };
        let client = CompletionClient::new(&config).expect("client builds");
        assert_eq!(client.api_base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn request_payload_shape_matches_the_api() {
        let request = ChatRequest {
            model: "openai/gpt-4o",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            max_tokens: 100,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        };
        let value = serde_json::to_value(&request).expect("serializes");
        assert_eq!(value["model"], "openai/gpt-4o");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["temperature"], 0.3);
        assert_eq!(value["top_p"], 0.9);
    }

    #[test]
    fn response_parsing_extracts_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"  # Readme  "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("parses");
        let content = parsed.choices.into_iter().next().unwrap().message.content;
        assert_eq!(content.trim(), "# Readme");
    }

    #[test]
    fn empty_choices_parse_but_carry_nothing() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).expect("parses");
        assert!(parsed.choices.is_empty());
    }
}
