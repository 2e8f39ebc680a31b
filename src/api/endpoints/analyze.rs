//! Analysis entry points: multipart upload and analyze-by-URL.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::MemeRecord;
use crate::pipeline::orchestrator::{analyze_image, fetch_image, AnalyzeRequest};
use crate::pipeline::ImagePayload;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: MemeRecord,
}

/// POST /api/analyze — multipart form with an `image` field.
pub async fn upload(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut image_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read image field: {e}")))?;
            image_bytes = Some(bytes);
            break;
        }
    }

    let bytes = image_bytes
        .ok_or_else(|| ApiError::BadRequest("missing 'image' field in upload".to_string()))?;
    let image = ImagePayload::from_bytes(&bytes).map_err(ApiError::from)?;

    let record = analyze_image(&ctx.db, &*ctx.llm, &ctx.models(), AnalyzeRequest::new(image))
        .await
        .map_err(ApiError::from)?;

    Ok(Json(AnalyzeResponse {
        success: true,
        data: record,
    }))
}

#[derive(Deserialize)]
pub struct AnalyzeUrlRequest {
    pub image_url: String,
    /// When set, re-analyze this existing row in place instead of inserting.
    #[serde(default)]
    pub meme_id: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeUrlResponse {
    pub success: bool,
    pub analysis_id: String,
    pub result: MemeRecord,
}

/// POST /api/analyze-url
pub async fn analyze_url(
    State(ctx): State<ApiContext>,
    Json(body): Json<AnalyzeUrlRequest>,
) -> Result<Json<AnalyzeUrlResponse>, ApiError> {
    if body.image_url.trim().is_empty() {
        return Err(ApiError::BadRequest("Image URL is required".to_string()));
    }

    // Re-analysis must target an existing row
    if let Some(id) = &body.meme_id {
        let db = crate::db::lock_db(&ctx.db)?;
        if crate::db::repository::get_analysis(&db, id)?.is_none() {
            return Err(ApiError::NotFound(format!("Meme {id} not found")));
        }
    }

    // Download first so dead links fail here, not at the provider. The
    // inlined payload is what gets stored for new rows; re-analysis updates
    // the existing row in place and keeps its stored image_url.
    let image = fetch_image(&ctx.http, &body.image_url)
        .await
        .map_err(ApiError::from)?;

    let mut request = AnalyzeRequest::new(image);
    request.existing_id = body.meme_id;
    request.source_url = Some(body.image_url.clone());

    let record = analyze_image(&ctx.db, &*ctx.llm, &ctx.models(), request)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(AnalyzeUrlResponse {
        success: true,
        analysis_id: record.id.clone(),
        result: record,
    }))
}
