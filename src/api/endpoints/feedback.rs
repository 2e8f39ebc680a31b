//! Feedback submission, evaluation, and the feedback-triggered re-analysis.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::lock_db;
use crate::llm::VisionClient;
use crate::db::repository::{
    get_analysis, insert_feedback, list_feedback, update_feedback_status,
};
use crate::models::{
    FeedbackRecord, FeedbackStatus, FeedbackType, MemeRecord,
};
use crate::pipeline::feedback_eval::{
    evaluate, fallback_should_reanalyze, FeedbackContext,
};
use crate::pipeline::orchestrator::{analyze_image, AnalyzeRequest};
use crate::pipeline::ImagePayload;

#[derive(Deserialize)]
pub struct SubmitFeedbackRequest {
    pub meme_id: String,
    pub feedback_type: FeedbackType,
    pub user_context: String,
    #[serde(default)]
    pub cultural_context: Option<String>,
    #[serde(default)]
    pub historical_context: Option<String>,
    #[serde(default)]
    pub additional_sources: Option<String>,
}

#[derive(Serialize)]
pub struct SubmitFeedbackResponse {
    pub success: bool,
    pub feedback_id: String,
    pub reanalyzed: bool,
    pub evaluation_reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MemeRecord>,
}

/// POST /api/feedback
///
/// The feedback row is stored unconditionally. A follow-up LLM call decides
/// whether to re-analyze; when that call fails, only explicitly-tagged
/// re-analysis requests trigger one. A failed re-analysis never fails the
/// submission.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Json(body): Json<SubmitFeedbackRequest>,
) -> Result<Json<SubmitFeedbackResponse>, ApiError> {
    if body.meme_id.trim().is_empty() || body.user_context.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "meme_id and user_context are required".to_string(),
        ));
    }

    let record = FeedbackRecord {
        id: Uuid::new_v4().to_string(),
        meme_id: body.meme_id.clone(),
        feedback_type: body.feedback_type,
        user_context: body.user_context.clone(),
        cultural_context: body.cultural_context.clone(),
        historical_context: body.historical_context.clone(),
        additional_sources: body.additional_sources.clone(),
        status: FeedbackStatus::Pending,
        created_at: Utc::now(),
    };

    {
        let db = lock_db(&ctx.db)?;
        insert_feedback(&db, &record)?;
    }
    tracing::info!(feedback_id = record.id, meme_id = body.meme_id, "Feedback stored");

    let context = FeedbackContext {
        feedback_type: body.feedback_type,
        user_context: &body.user_context,
        cultural_context: body.cultural_context.as_deref(),
        historical_context: body.historical_context.as_deref(),
        additional_sources: body.additional_sources.as_deref(),
    };

    let (should_reanalyze, evaluation_reasoning) = if !ctx.llm.is_configured() {
        tracing::warn!("LLM not configured, skipping feedback evaluation");
        (fallback_should_reanalyze(body.feedback_type), String::new())
    } else {
        match evaluate(&*ctx.llm, &ctx.config.text_model, &context).await {
            Ok(evaluation) => (evaluation.should_reanalyze, evaluation.reasoning),
            Err(e) => {
                tracing::warn!(error = %e, "Feedback evaluation failed, applying fallback");
                (fallback_should_reanalyze(body.feedback_type), String::new())
            }
        }
    };

    let mut result = None;
    if should_reanalyze {
        result = reanalyze_with_feedback(&ctx, &body.meme_id, &record.id, &context).await;
    }

    Ok(Json(SubmitFeedbackResponse {
        success: true,
        feedback_id: record.id,
        reanalyzed: should_reanalyze,
        evaluation_reasoning,
        result,
    }))
}

/// Re-run the pipeline with the feedback appended as context, updating the
/// existing row. Every failure is swallowed into a warning.
async fn reanalyze_with_feedback(
    ctx: &ApiContext,
    meme_id: &str,
    feedback_id: &str,
    context: &FeedbackContext<'_>,
) -> Option<MemeRecord> {
    let original = {
        let db = lock_db(&ctx.db).ok()?;
        get_analysis(&db, meme_id).ok()?
    }?;

    let image = if original.image_url.starts_with("data:") {
        ImagePayload::from_data_url(&original.image_url)
    } else {
        ImagePayload::from_url(&original.image_url)
    };
    let image = match image {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!(meme_id, error = %e, "Stored image unusable for re-analysis");
            return None;
        }
    };

    let mut request = AnalyzeRequest::new(image);
    request.existing_id = Some(meme_id.to_string());
    request.additional_context = Some(context.reanalysis_context());
    request.from_feedback = true;

    match analyze_image(&ctx.db, &*ctx.llm, &ctx.models(), request).await {
        Ok(updated) => {
            if let Ok(db) = lock_db(&ctx.db) {
                if let Err(e) =
                    update_feedback_status(&db, feedback_id, FeedbackStatus::Incorporated)
                {
                    tracing::warn!(feedback_id, error = %e, "Failed to mark feedback incorporated");
                }
            }
            tracing::info!(meme_id, "Re-analysis complete, row updated in place");
            Some(updated)
        }
        Err(e) => {
            tracing::warn!(meme_id, error = %e, "Feedback-triggered re-analysis failed");
            None
        }
    }
}

#[derive(Deserialize)]
pub struct ListFeedbackQuery {
    pub meme_id: String,
}

#[derive(Serialize)]
pub struct ListFeedbackResponse {
    pub feedback: Vec<FeedbackRecord>,
}

/// GET /api/feedback?meme_id=
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ListFeedbackQuery>,
) -> Result<Json<ListFeedbackResponse>, ApiError> {
    let feedback = {
        let db = lock_db(&ctx.db)?;
        list_feedback(&db, &query.meme_id)?
    };
    Ok(Json(ListFeedbackResponse { feedback }))
}
