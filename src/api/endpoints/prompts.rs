//! Prompt registry administration: list, in-place edit, and versioning.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::lock_db;
use crate::db::repository::{create_prompt_version, get_prompt, list_prompts, update_prompt};
use crate::models::PromptRecord;

#[derive(Serialize)]
pub struct ListPromptsResponse {
    pub prompts: Vec<PromptRecord>,
}

/// GET /api/admin/prompts
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<ListPromptsResponse>, ApiError> {
    let prompts = {
        let db = lock_db(&ctx.db)?;
        list_prompts(&db)?
    };
    Ok(Json(ListPromptsResponse { prompts }))
}

#[derive(Deserialize)]
pub struct UpdatePromptRequest {
    pub id: String,
    pub prompt_text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version_name: Option<String>,
}

#[derive(Serialize)]
pub struct PromptResponse {
    pub success: bool,
    pub prompt: PromptRecord,
}

/// PUT /api/admin/prompts — edit a stored version in place.
pub async fn update(
    State(ctx): State<ApiContext>,
    Json(body): Json<UpdatePromptRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    if body.prompt_text.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt_text must not be empty".to_string()));
    }

    let db = lock_db(&ctx.db)?;
    update_prompt(
        &db,
        &body.id,
        &body.prompt_text,
        body.description.as_deref(),
        body.version_name.as_deref(),
    )?;
    let prompt = get_prompt(&db, &body.id)?.ok_or_else(|| {
        ApiError::NotFound(format!("Prompt {} not found", body.id))
    })?;

    Ok(Json(PromptResponse {
        success: true,
        prompt,
    }))
}

#[derive(Deserialize)]
pub struct NewVersionRequest {
    pub name: String,
    pub version_name: String,
    pub prompt_text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_version_id: Option<String>,
}

/// POST /api/admin/prompts/version — new current version for a prompt name.
pub async fn new_version(
    State(ctx): State<ApiContext>,
    Json(body): Json<NewVersionRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    if body.name.trim().is_empty() || body.prompt_text.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "name and prompt_text are required".to_string(),
        ));
    }

    let prompt = {
        let db = lock_db(&ctx.db)?;
        create_prompt_version(
            &db,
            &body.name,
            &body.version_name,
            &body.prompt_text,
            body.description.as_deref(),
            body.parent_version_id.as_deref(),
        )?
    };

    Ok(Json(PromptResponse {
        success: true,
        prompt,
    }))
}
