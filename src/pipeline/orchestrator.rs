//! End-to-end flow: prompt lookup → recognition gate → claim analysis →
//! persistence. The one place that decides insert-vs-update.

use std::sync::Mutex;

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use super::analysis::analyze_claims;
use super::prompts::{
    ANALYSIS_PROMPT_NAME, DEFAULT_ANALYSIS_PROMPT, DEFAULT_RECOGNITION_PROMPT,
    RECOGNITION_PROMPT_NAME,
};
use super::recognition::recognize;
use super::{AnalysisError, ImagePayload};
use crate::db::repository::{
    current_prompt_text, get_analysis, insert_analysis, update_analysis_result,
};
use crate::db::{lock_db, DatabaseError};
use crate::llm::VisionClient;
use crate::models::MemeRecord;

/// Models used by the two vision call sites.
#[derive(Debug, Clone)]
pub struct PipelineModels {
    pub vision: String,
}

/// One analysis request. `existing_id` switches insert to update-in-place.
#[derive(Debug)]
pub struct AnalyzeRequest {
    pub image: ImagePayload,
    pub existing_id: Option<String>,
    pub additional_context: Option<String>,
    pub title: Option<String>,
    pub source_url: Option<String>,
    /// Set when the update is driven by incorporated feedback.
    pub from_feedback: bool,
}

impl AnalyzeRequest {
    pub fn new(image: ImagePayload) -> Self {
        Self {
            image,
            existing_id: None,
            additional_context: None,
            title: None,
            source_url: None,
            from_feedback: false,
        }
    }
}

/// Run the full pipeline for one image.
///
/// The recognition gate runs first; confidence below the threshold stops
/// the flow before the analysis call is ever issued. On success the result
/// is persisted (insert, or update-in-place when `existing_id` is set — a
/// re-analysis never creates a second row) and the stored record returned.
pub async fn analyze_image<C: VisionClient>(
    conn: &Mutex<Connection>,
    client: &C,
    models: &PipelineModels,
    request: AnalyzeRequest,
) -> Result<MemeRecord, AnalysisError> {
    // Prompt texts come from the registry, falling back to the compiled-in
    // defaults. Lock is released before any LLM call.
    let (recognition_prompt, analysis_prompt) = {
        let db = lock_db(conn)?;
        (
            current_prompt_text(&db, RECOGNITION_PROMPT_NAME)?
                .unwrap_or_else(|| DEFAULT_RECOGNITION_PROMPT.prompt_text.to_string()),
            current_prompt_text(&db, ANALYSIS_PROMPT_NAME)?
                .unwrap_or_else(|| DEFAULT_ANALYSIS_PROMPT.prompt_text.to_string()),
        )
    };

    let recognition = recognize(client, &recognition_prompt, &models.vision, &request.image).await?;

    if !recognition.passes_gate() {
        tracing::info!(
            confidence = recognition.confidence,
            "Image rejected - not recognized as a meme"
        );
        return Err(AnalysisError::NotAMeme {
            confidence: recognition.confidence,
            rejection_reasons: recognition.rejection_reasons,
            reasoning: recognition.reasoning,
        });
    }

    tracing::info!(
        confidence = recognition.confidence,
        "Image recognized as meme, proceeding to analysis"
    );

    let outcome = analyze_claims(
        client,
        &analysis_prompt,
        &models.vision,
        &request.image,
        request.additional_context.as_deref(),
    )
    .await?;

    let verdict = outcome.verdict.storage_str();
    let overall_explanation = outcome.overall_explanation();
    let sources = outcome.flattened_sources();

    let db = lock_db(conn)?;
    match request.existing_id {
        Some(id) => {
            update_analysis_result(
                &db,
                &id,
                verdict,
                outcome.confidence,
                &overall_explanation,
                &outcome.claims,
                &sources,
                request.from_feedback,
            )?;
            get_analysis(&db, &id)?.ok_or_else(|| {
                AnalysisError::Storage(DatabaseError::NotFound {
                    entity_type: "MemeAnalysis".into(),
                    id,
                })
            })
        }
        None => {
            let record = MemeRecord {
                id: Uuid::new_v4().to_string(),
                image_url: request.image.as_str().to_string(),
                title: request.title,
                source_url: request.source_url,
                verdict: verdict.to_string(),
                confidence: outcome.confidence,
                overall_explanation: Some(overall_explanation),
                claims: outcome.claims,
                sources,
                feedback_incorporated: false,
                analyzed_at: Utc::now(),
                updated_at: None,
            };
            insert_analysis(&db, &record)?;
            Ok(record)
        }
    }
}

/// Download a remote image and inline it as a validated data URL.
pub async fn fetch_image(
    http: &reqwest::Client,
    url: &str,
) -> Result<ImagePayload, AnalysisError> {
    // Reject non-http(s) URLs before touching the network
    ImagePayload::from_url(url)?;

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| AnalysisError::Network(format!("failed to fetch image: {e}")))?;

    if !response.status().is_success() {
        return Err(AnalysisError::Network(format!(
            "failed to fetch image: {} ({})",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalysisError::Network(format!("failed to read image body: {e}")))?;

    ImagePayload::from_bytes(&bytes)
}
