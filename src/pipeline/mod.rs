//! The two-stage meme pipeline: recognition gate → claim analysis,
//! plus feedback evaluation and the shared JSON plumbing.

pub mod analysis;
pub mod confidence;
pub mod feedback_eval;
pub mod json_extract;
pub mod orchestrator;
pub mod prompts;
pub mod recognition;

use base64::Engine as _;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::llm::LlmError;

/// Pipeline failure taxonomy. Each variant maps 1:1 to an API error
/// category surfaced to the caller; nothing here is retried.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("This doesn't appear to be a meme ({confidence}% confidence)")]
    NotAMeme {
        confidence: u8,
        rejection_reasons: Vec<String>,
        reasoning: String,
    },

    #[error("AI service is not configured")]
    NotConfigured,

    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,

    #[error("AI response validation failed: {0}")]
    InvalidResponse(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("AI service error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl From<LlmError> for AnalysisError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => AnalysisError::NotConfigured,
            LlmError::RateLimited => AnalysisError::RateLimited,
            LlmError::InvalidRequest(body) => AnalysisError::InvalidImage(body),
            LlmError::Timeout(secs) => {
                AnalysisError::Network(format!("request timed out after {secs}s"))
            }
            LlmError::Network(msg) => AnalysisError::Network(msg),
            LlmError::ResponseParsing(msg) => AnalysisError::Upstream(msg),
            LlmError::EmptyResponse => AnalysisError::Upstream("empty response".to_string()),
            LlmError::Api { status, body } => {
                AnalysisError::Upstream(format!("status {status}: {body}"))
            }
        }
    }
}

/// An image ready to be sent to the vision model: either a remote http(s)
/// URL or an inline base64 data URL.
#[derive(Debug, Clone)]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Validate raw bytes as a decodable image and inline them as a data URL.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::InvalidImage("empty image payload".into()));
        }
        let format = image::guess_format(bytes)
            .map_err(|_| AnalysisError::InvalidImage("unrecognized image format".into()))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self(format!(
            "data:{};base64,{encoded}",
            format.to_mime_type()
        )))
    }

    /// Accept an already-formed data URL without re-validating its bytes.
    pub fn from_data_url(url: &str) -> Result<Self, AnalysisError> {
        if !url.starts_with("data:image/") {
            return Err(AnalysisError::InvalidImage(
                "expected a data:image/* URL".into(),
            ));
        }
        Ok(Self(url.to_string()))
    }

    /// A remote image URL, passed through to the vision model as-is.
    pub fn from_url(url: &str) -> Result<Self, AnalysisError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| AnalysisError::InvalidImage(format!("invalid URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AnalysisError::InvalidImage(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
