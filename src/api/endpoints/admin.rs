//! Admin console operations: deletion and exact-URL deduplication.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::batch::{run_bounded, BatchItemError, BatchReport, DELETE_BATCH_WIDTH};
use crate::db::lock_db;
use crate::db::repository::{delete_analysis, list_analyses};
use crate::ingest::group_exact_duplicates;
use crate::models::MemeRecord;

#[derive(Deserialize)]
pub struct DeleteMemeRequest {
    pub meme_id: String,
}

#[derive(Serialize)]
pub struct DeleteMemeResponse {
    pub success: bool,
}

/// POST /api/admin/delete-meme
pub async fn delete_meme(
    State(ctx): State<ApiContext>,
    Json(body): Json<DeleteMemeRequest>,
) -> Result<Json<DeleteMemeResponse>, ApiError> {
    let deleted = {
        let db = lock_db(&ctx.db)?;
        delete_analysis(&db, &body.meme_id)?
    };
    if !deleted {
        return Err(ApiError::NotFound(format!(
            "Meme {} not found",
            body.meme_id
        )));
    }
    tracing::info!(meme_id = body.meme_id, "Meme deleted");
    Ok(Json(DeleteMemeResponse { success: true }))
}

#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    pub meme_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct BulkDeleteResponse {
    pub success: bool,
    pub report: BatchReport,
}

/// POST /api/admin/bulk-delete — bounded fan-out over the delete path;
/// one missing row never aborts the rest.
pub async fn bulk_delete(
    State(ctx): State<ApiContext>,
    Json(body): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    if body.meme_ids.is_empty() {
        return Err(ApiError::BadRequest("meme_ids array is required".to_string()));
    }

    let report = run_bounded(body.meme_ids, DELETE_BATCH_WIDTH, |id| {
        let ctx = ctx.clone();
        async move {
            let deleted = {
                let db = lock_db(&ctx.db).map_err(|e| BatchItemError {
                    id: id.clone(),
                    error: e.to_string(),
                })?;
                delete_analysis(&db, &id).map_err(|e| BatchItemError {
                    id: id.clone(),
                    error: e.to_string(),
                })?
            };
            if deleted {
                Ok(())
            } else {
                Err(BatchItemError {
                    id,
                    error: "not found".to_string(),
                })
            }
        }
    })
    .await;

    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "Bulk delete complete"
    );

    Ok(Json(BulkDeleteResponse {
        success: true,
        report,
    }))
}

const DEFAULT_DUPLICATE_SCAN_LIMIT: u32 = 200;
const MAX_DUPLICATE_SCAN_LIMIT: u32 = 500;

#[derive(Deserialize)]
pub struct DuplicatesQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct DuplicatesResponse {
    /// Groups of rows sharing an identical image URL; the admin keeps one
    /// per group and deletes the rest through the delete endpoint.
    pub groups: Vec<Vec<MemeRecord>>,
    pub group_count: usize,
    pub total_duplicates: usize,
    pub scanned: usize,
}

/// GET /api/admin/duplicates — exact-match grouping over a bounded page of
/// recent rows. No perceptual hashing.
pub async fn duplicates(
    State(ctx): State<ApiContext>,
    Query(query): Query<DuplicatesQuery>,
) -> Result<Json<DuplicatesResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_DUPLICATE_SCAN_LIMIT)
        .clamp(1, MAX_DUPLICATE_SCAN_LIMIT);

    let (records, _) = {
        let db = lock_db(&ctx.db)?;
        list_analyses(&db, None, 1, limit)?
    };
    let scanned = records.len();

    let groups = group_exact_duplicates(&records);
    let total_duplicates = groups.iter().map(Vec::len).sum();

    Ok(Json(DuplicatesResponse {
        group_count: groups.len(),
        total_duplicates,
        scanned,
        groups,
    }))
}
