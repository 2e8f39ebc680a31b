//! API error types with structured JSON responses.
//!
//! Every failure category surfaces as `{success:false, category, message,
//! details}` with a mapped HTTP status. The outermost handlers return
//! `Result<_, ApiError>`; nothing is retried on the server side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::ingest::RedditError;
use crate::pipeline::AnalysisError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub category: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    NotAMeme { message: String, details: String },
    #[error("AI service is not configured")]
    ServiceNotConfigured(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("AI response validation failed")]
    InvalidResponse(String),
    #[error("Invalid image")]
    InvalidImage(String),
    #[error("Network error")]
    NetworkError(String),
    #[error("Storage error")]
    Storage(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Admin authentication required")]
    Unauthorized,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotAMeme { .. } => "not_a_meme",
            Self::ServiceNotConfigured(_) => "service_not_configured",
            Self::RateLimited => "rate_limited",
            Self::InvalidResponse(_) => "invalid_response",
            Self::InvalidImage(_) => "invalid_image",
            Self::NetworkError(_) => "network_error",
            Self::Storage(_) => "storage_error",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Internal(_) => "unknown",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotAMeme { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ServiceNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidImage(_) => StatusCode::BAD_REQUEST,
            Self::NetworkError(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (message, details) = match &self {
            ApiError::NotAMeme { message, details } => (message.clone(), Some(details.clone())),
            ApiError::ServiceNotConfigured(detail) => (
                "AI service is not configured".to_string(),
                Some(detail.clone()),
            ),
            ApiError::RateLimited => (
                "Rate limit exceeded. Please wait a moment and try again.".to_string(),
                None,
            ),
            ApiError::InvalidResponse(detail) => (
                "The AI model returned a response that doesn't match the expected format"
                    .to_string(),
                Some(detail.clone()),
            ),
            ApiError::InvalidImage(detail) => {
                ("Invalid image format".to_string(), Some(detail.clone()))
            }
            ApiError::NetworkError(detail) => {
                ("Network error".to_string(), Some(detail.clone()))
            }
            ApiError::Storage(detail) => {
                ("Failed to access storage".to_string(), Some(detail.clone()))
            }
            ApiError::NotFound(detail) => (detail.clone(), None),
            ApiError::BadRequest(detail) => (detail.clone(), None),
            ApiError::Unauthorized => ("Admin authentication required".to_string(), None),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                ("An unexpected error occurred".to_string(), None)
            }
        };

        let body = ErrorBody {
            success: false,
            category: self.category(),
            message,
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::NotAMeme {
                confidence,
                rejection_reasons,
                reasoning,
            } => {
                let reasons = rejection_reasons
                    .iter()
                    .map(|r| format!("\u{2022} {r}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                ApiError::NotAMeme {
                    message: format!(
                        "This doesn't appear to be a meme ({confidence}% confidence)"
                    ),
                    details: format!("Reasons:\n{reasons}\n\nExplanation: {reasoning}"),
                }
            }
            AnalysisError::NotConfigured => ApiError::ServiceNotConfigured(
                "The XAI_API_KEY environment variable is missing. Please contact the administrator.".to_string(),
            ),
            AnalysisError::RateLimited => ApiError::RateLimited,
            AnalysisError::InvalidResponse(detail) => ApiError::InvalidResponse(detail),
            AnalysisError::InvalidImage(detail) => ApiError::InvalidImage(detail),
            AnalysisError::Network(detail) => ApiError::NetworkError(detail),
            AnalysisError::Upstream(detail) => ApiError::Internal(detail),
            AnalysisError::Storage(db) => db.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::ConstraintViolation(detail) => ApiError::Storage(format!(
                "This meme has already been analyzed. {detail}"
            )),
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<RedditError> for ApiError {
    fn from(err: RedditError) -> Self {
        match err {
            RedditError::NotConfigured => ApiError::ServiceNotConfigured(
                "Reddit API credentials not configured".to_string(),
            ),
            RedditError::Network(detail) => ApiError::NetworkError(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 65536).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_a_meme_returns_422_with_reasons() {
        let err: ApiError = AnalysisError::NotAMeme {
            confidence: 30,
            rejection_reasons: vec!["No text overlay detected".to_string()],
            reasoning: "Looks like a vacation photo.".to_string(),
        }
        .into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["category"], "not_a_meme");
        assert!(json["message"].as_str().unwrap().contains("30%"));
        assert!(json["details"]
            .as_str()
            .unwrap()
            .contains("No text overlay detected"));
    }

    #[tokio::test]
    async fn not_configured_returns_503() {
        let err: ApiError = AnalysisError::NotConfigured.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = body_json(response).await;
        assert_eq!(json["category"], "service_not_configured");
    }

    #[tokio::test]
    async fn rate_limited_returns_429() {
        let response = ApiError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let json = body_json(response).await;
        assert_eq!(json["category"], "rate_limited");
    }

    #[tokio::test]
    async fn invalid_response_returns_502() {
        let err: ApiError = AnalysisError::InvalidResponse("bad verdict".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["category"], "invalid_response");
        assert_eq!(json["details"], "bad verdict");
    }

    #[tokio::test]
    async fn database_not_found_maps_to_404() {
        let err: ApiError = DatabaseError::NotFound {
            entity_type: "MemeAnalysis".into(),
            id: "abc".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["category"], "not_found");
    }

    #[tokio::test]
    async fn duplicate_insert_mentions_already_analyzed() {
        let err: ApiError =
            DatabaseError::ConstraintViolation("image_url collision".into()).into();
        let json = body_json(err.into_response()).await;
        assert_eq!(json["category"], "storage_error");
        assert!(json["details"].as_str().unwrap().contains("already been analyzed"));
    }

    #[tokio::test]
    async fn internal_hides_detail_from_client() {
        let response = ApiError::Internal("secret stack trace".to_string()).into_response();
        let json = body_json(response).await;
        assert_eq!(json["category"], "unknown");
        assert_eq!(json["message"], "An unexpected error occurred");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["category"], "unauthorized");
    }
}
