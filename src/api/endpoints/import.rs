//! Bulk import and bulk analysis endpoints (admin surface).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::batch::{run_bounded, BatchItemError, BatchReport, REANALYZE_BATCH_WIDTH};
use crate::db::lock_db;
use crate::db::repository::existing_image_urls;
use crate::ingest::importer::{
    fetch_candidates, quick_fill, FETCH_PER_SUBREDDIT, QUICK_FILL_SUBREDDITS,
};
use crate::ingest::{CandidateMeme, DuplicateIndex, ImportSummary};
use crate::pipeline::orchestrator::{analyze_image, fetch_image, AnalyzeRequest};

/// Cap on candidates returned by a manual fetch.
const FETCH_MAX_CANDIDATES: usize = 200;

#[derive(Deserialize)]
pub struct BulkMemeDescriptor {
    /// When set, the row is re-analyzed in place.
    #[serde(default)]
    pub id: Option<String>,
    pub image_url: String,
}

#[derive(Deserialize)]
pub struct BulkAnalyzeRequest {
    pub memes: Vec<BulkMemeDescriptor>,
}

#[derive(Serialize)]
pub struct BulkAnalyzeResponse {
    pub success: bool,
    pub analyzed: usize,
    pub failed: usize,
    pub errors: Vec<BatchItemError>,
}

/// POST /api/admin/bulk-analyze
///
/// Bounded fan-out; each item downloads its image and runs the full
/// pipeline. A single item's failure never aborts the batch.
pub async fn bulk_analyze(
    State(ctx): State<ApiContext>,
    Json(body): Json<BulkAnalyzeRequest>,
) -> Result<Json<BulkAnalyzeResponse>, ApiError> {
    if body.memes.is_empty() {
        return Err(ApiError::BadRequest("memes array is required".to_string()));
    }

    tracing::info!(count = body.memes.len(), "Starting bulk analysis");

    let report = run_bounded(body.memes, REANALYZE_BATCH_WIDTH, |meme| {
        let ctx = ctx.clone();
        async move {
            let item_id = meme.id.clone().unwrap_or_else(|| meme.image_url.clone());
            let outcome = async {
                let image = fetch_image(&ctx.http, &meme.image_url).await?;
                let mut request = AnalyzeRequest::new(image);
                request.existing_id = meme.id.clone();
                request.source_url = Some(meme.image_url.clone());
                analyze_image(&ctx.db, &*ctx.llm, &ctx.models(), request).await
            }
            .await;

            outcome.map(|_| ()).map_err(|e| BatchItemError {
                id: item_id,
                error: e.to_string(),
            })
        }
    })
    .await;

    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "Bulk analysis complete"
    );

    Ok(Json(BulkAnalyzeResponse {
        success: true,
        analyzed: report.succeeded,
        failed: report.failed,
        errors: report.errors,
    }))
}

#[derive(Deserialize)]
pub struct ImportUrlsRequest {
    pub urls: Vec<String>,
}

#[derive(Serialize)]
pub struct ImportUrlsResponse {
    pub success: bool,
    pub message: String,
    pub report: BatchReport,
}

/// POST /api/admin/import-urls — download, analyze, and insert each URL.
pub async fn import_urls(
    State(ctx): State<ApiContext>,
    Json(body): Json<ImportUrlsRequest>,
) -> Result<Json<ImportUrlsResponse>, ApiError> {
    if body.urls.is_empty() {
        return Err(ApiError::BadRequest("No URLs provided".to_string()));
    }

    let report = run_bounded(body.urls, REANALYZE_BATCH_WIDTH, |url| {
        let ctx = ctx.clone();
        async move {
            let outcome = async {
                let image = fetch_image(&ctx.http, &url).await?;
                let mut request = AnalyzeRequest::new(image);
                request.source_url = Some(url.clone());
                analyze_image(&ctx.db, &*ctx.llm, &ctx.models(), request).await
            }
            .await;

            outcome.map(|_| ()).map_err(|e| BatchItemError {
                id: url,
                error: e.to_string(),
            })
        }
    })
    .await;

    let message = format!(
        "Successfully imported {} meme(s). {} failed.",
        report.succeeded, report.failed
    );

    Ok(Json(ImportUrlsResponse {
        success: true,
        message,
        report,
    }))
}

#[derive(Deserialize)]
pub struct FetchMemesRequest {
    /// Subreddit names to fetch, e.g. ["memes", "AdviceAnimals"].
    #[serde(default)]
    pub sites: Option<Vec<String>>,
    /// Fetch the whole fixed subreddit list instead.
    #[serde(default)]
    pub quick_fill: Option<bool>,
}

#[derive(Serialize)]
pub struct FetchMemesResponse {
    pub success: bool,
    pub memes: Vec<CandidateMeme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// POST /api/admin/fetch-memes — return deduplicated, ranked candidates
/// without inserting anything.
pub async fn fetch_memes(
    State(ctx): State<ApiContext>,
    Json(body): Json<FetchMemesRequest>,
) -> Result<Json<FetchMemesResponse>, ApiError> {
    let subreddits: Vec<String> = if body.quick_fill.unwrap_or(false) {
        QUICK_FILL_SUBREDDITS.iter().map(|s| s.to_string()).collect()
    } else {
        body.sites.unwrap_or_default()
    };

    if subreddits.is_empty() {
        return Err(ApiError::BadRequest("No sites selected".to_string()));
    }

    let index = {
        let db = lock_db(&ctx.db)?;
        DuplicateIndex::from_urls(existing_image_urls(&db)?)
    };

    let outcome = fetch_candidates(
        &ctx.reddit,
        &subreddits,
        FETCH_PER_SUBREDDIT,
        &index,
        FETCH_MAX_CANDIDATES,
    )
    .await;

    let warning = (!outcome.failed_sources.is_empty())
        .then(|| format!("Some sources failed: {}", outcome.failed_sources.join(", ")));

    Ok(Json(FetchMemesResponse {
        success: true,
        memes: outcome.candidates,
        warning,
    }))
}

#[derive(Serialize)]
pub struct QuickFillResponse {
    pub success: bool,
    pub message: String,
    pub summary: ImportSummary,
}

/// POST /api/admin/quick-fill — fetch the fixed subreddit list and persist
/// every new candidate as a PENDING row.
pub async fn quick_fill_handler(
    State(ctx): State<ApiContext>,
) -> Result<Json<QuickFillResponse>, ApiError> {
    let summary = quick_fill(&ctx.db, &ctx.reddit).await?;

    if summary.total_fetched == 0 && summary.saved == 0 {
        return Err(ApiError::NetworkError(
            "No memes found. Please check Reddit API credentials.".to_string(),
        ));
    }

    let message = format!(
        "Successfully fetched and saved {} new memes from Reddit (skipped {} duplicates)",
        summary.saved, summary.skipped
    );

    Ok(Json(QuickFillResponse {
        success: true,
        message,
        summary,
    }))
}
