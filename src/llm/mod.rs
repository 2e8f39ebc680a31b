//! OpenAI-compatible vision LLM client (xAI/Grok wire shape).
//!
//! One provider boundary: the [`VisionClient`] trait, with [`GrokClient`] as
//! the production implementation and [`MockVisionClient`] for tests.

pub mod client;
pub mod types;

pub use client::{GrokClient, MockVisionClient};
pub use types::{ChatMessage, ChatOptions, ContentPart, Role};

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    NotConfigured,

    #[error("Rate limit exceeded on the LLM API")]
    RateLimited,

    #[error("LLM API rejected the request: {0}")]
    InvalidRequest(String),

    #[error("LLM API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error reaching the LLM API: {0}")]
    Network(String),

    #[error("Failed to parse LLM API response: {0}")]
    ResponseParsing(String),

    #[error("LLM API returned no choices")]
    EmptyResponse,
}

/// A chat-completions client that can see images.
pub trait VisionClient: Send + Sync {
    /// Send a message list and return the assistant's text content.
    fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Whether credentials are present. Callers use this to decide between
    /// a hard `service_not_configured` error and a silent fallback.
    fn is_configured(&self) -> bool;
}
