use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::types::{ChatMessage, ChatOptions};
use super::{LlmError, VisionClient};
use crate::config::AppConfig;

/// Production client for the xAI chat-completions endpoint.
pub struct GrokClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
    timeout_secs: u64,
}

impl GrokClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
            timeout_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.llm_base_url,
            config.api_key.clone(),
            config.llm_timeout_secs,
        )
    }
}

/// Request body for /chat/completions
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response body from /chat/completions
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl VisionClient for GrokClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &options.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: options
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body, "LLM API error");
            return Err(match status.as_u16() {
                429 => LlmError::RateLimited,
                400 => LlmError::InvalidRequest(body),
                code => LlmError::Api { status: code, body },
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        tracing::info!(
            model = %options.model,
            elapsed_ms = %start.elapsed().as_millis(),
            response_len = content.len(),
            "LLM call complete"
        );

        Ok(content)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ── Mock client ─────────────────────────────────────────────

enum MockReply {
    Text(String),
    Error,
}

/// Mock vision client for tests — replays scripted responses in order.
pub struct MockVisionClient {
    replies: Mutex<VecDeque<MockReply>>,
    configured: bool,
    calls: Mutex<u32>,
}

impl MockVisionClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            configured: true,
            calls: Mutex::new(0),
        }
    }

    /// A client with no API key: every call fails with `NotConfigured`.
    pub fn unconfigured() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            configured: false,
            calls: Mutex::new(0),
        }
    }

    pub fn with_response(self, response: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Text(response.to_string()));
        self
    }

    /// Queue a hard API failure at this position in the script.
    pub fn with_error(self) -> Self {
        self.replies.lock().unwrap().push_back(MockReply::Error);
        self
    }

    /// Number of chat calls observed so far.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl Default for MockVisionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl VisionClient for MockVisionClient {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<String, LlmError> {
        *self.calls.lock().unwrap() += 1;
        if !self.configured {
            return Err(LlmError::NotConfigured);
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error) => Err(LlmError::Api {
                status: 500,
                body: "mock failure".to_string(),
            }),
            None => Err(LlmError::EmptyResponse),
        }
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
