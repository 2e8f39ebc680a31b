use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::count_analyses;
use crate::db::lock_db;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub memes_analyzed: i64,
    pub llm_configured: bool,
}

pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let count = {
        let db = lock_db(&ctx.db)?;
        count_analyses(&db)?
    };
    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        memes_analyzed: count,
        llm_configured: ctx.config.api_key.is_some(),
    }))
}
