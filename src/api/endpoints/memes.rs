//! Gallery list and single-record fetch.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::lock_db;
use crate::db::repository::{get_analysis, list_analyses};
use crate::models::MemeRecord;

const DEFAULT_PER_PAGE: u32 = 9;
const MAX_PER_PAGE: u32 = 50;

#[derive(Deserialize)]
pub struct GalleryQuery {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Serialize)]
pub struct GalleryResponse {
    pub memes: Vec<MemeRecord>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
}

/// GET /api/memes — newest first, exact-match verdict filter, paginated.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    // Filters arrive in any case; storage is normalized uppercase.
    let filter = query
        .filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("all"))
        .map(|f| f.to_ascii_uppercase());

    let (memes, total) = {
        let db = lock_db(&ctx.db)?;
        list_analyses(&db, filter.as_deref(), page, per_page)?
    };

    let total_pages = (total + per_page as i64 - 1) / per_page as i64;

    Ok(Json(GalleryResponse {
        memes,
        total,
        page,
        per_page,
        total_pages,
    }))
}

#[derive(Serialize)]
pub struct MemeResponse {
    pub meme: MemeRecord,
}

/// GET /api/memes/:id
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MemeResponse>, ApiError> {
    let meme = {
        let db = lock_db(&ctx.db)?;
        get_analysis(&db, &id)?
    };
    match meme {
        Some(meme) => Ok(Json(MemeResponse { meme })),
        None => Err(ApiError::NotFound(format!("Meme {id} not found"))),
    }
}
