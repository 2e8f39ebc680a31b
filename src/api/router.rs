//! HTTP router.
//!
//! Public surface: health, analysis, gallery, feedback.
//! Admin surface (X-Admin-Token guard): bulk operations, Reddit import,
//! deletion, deduplication, prompt registry.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Uploads are capped at 10 MiB.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn api_router(ctx: ApiContext) -> Router {
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/analyze", post(endpoints::analyze::upload))
        .route("/analyze-url", post(endpoints::analyze::analyze_url))
        .route("/memes", get(endpoints::memes::list))
        .route("/memes/:id", get(endpoints::memes::detail))
        .route(
            "/feedback",
            post(endpoints::feedback::submit).get(endpoints::feedback::list),
        )
        .with_state(ctx.clone());

    let admin = Router::new()
        .route("/bulk-analyze", post(endpoints::import::bulk_analyze))
        .route("/import-urls", post(endpoints::import::import_urls))
        .route("/fetch-memes", post(endpoints::import::fetch_memes))
        .route("/quick-fill", post(endpoints::import::quick_fill_handler))
        .route("/delete-meme", post(endpoints::admin::delete_meme))
        .route("/bulk-delete", post(endpoints::admin::bulk_delete))
        .route("/duplicates", get(endpoints::admin::duplicates))
        .route(
            "/prompts",
            get(endpoints::prompts::list).put(endpoints::prompts::update),
        )
        .route("/prompts/version", post(endpoints::prompts::new_version))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(
            middleware::admin::require_admin,
        ))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", public)
        .nest("/api/admin", admin)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
