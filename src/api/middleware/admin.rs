//! Admin route guard: a shared-secret `X-Admin-Token` header.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Reject admin requests whose token header does not match the configured
/// secret. With no secret configured the admin surface is disabled.
pub async fn require_admin(
    Extension(ctx): Extension<ApiContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = ctx.config.admin_token.as_deref().ok_or_else(|| {
        ApiError::ServiceNotConfigured(
            "MEMECHECK_ADMIN_TOKEN is not set; the admin API is disabled".to_string(),
        )
    })?;

    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthorized),
    }
}
