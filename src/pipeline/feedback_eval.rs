//! Feedback evaluation — a small text-only LLM call that decides whether
//! user feedback warrants re-running the analysis.

use serde::{Deserialize, Serialize};

use super::json_extract::{extract_json, JsonExtractError};
use super::AnalysisError;
use crate::llm::{ChatMessage, ChatOptions, ContentPart, VisionClient};
use crate::models::FeedbackType;

const EVALUATION_MAX_TOKENS: u32 = 500;
const EVALUATION_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvaluation {
    pub is_valid: bool,
    pub adds_value: bool,
    pub should_reanalyze: bool,
    pub reasoning: String,
}

/// The feedback fields that feed both the evaluation prompt and the
/// re-analysis context block.
#[derive(Debug, Clone)]
pub struct FeedbackContext<'a> {
    pub feedback_type: FeedbackType,
    pub user_context: &'a str,
    pub cultural_context: Option<&'a str>,
    pub historical_context: Option<&'a str>,
    pub additional_sources: Option<&'a str>,
}

impl FeedbackContext<'_> {
    fn describe(&self) -> String {
        let mut block = format!(
            "Feedback Type: {}\nUser Context: {}",
            self.feedback_type, self.user_context
        );
        if let Some(cultural) = self.cultural_context {
            block.push_str(&format!("\nCultural Context: {cultural}"));
        }
        if let Some(historical) = self.historical_context {
            block.push_str(&format!("\nHistorical Context: {historical}"));
        }
        if let Some(sources) = self.additional_sources {
            block.push_str(&format!("\nAdditional Sources: {sources}"));
        }
        block
    }

    /// The context block appended to the analysis prompt on re-analysis.
    pub fn reanalysis_context(&self) -> String {
        let mut block = format!("User Feedback: {}", self.user_context);
        if let Some(cultural) = self.cultural_context {
            block.push_str(&format!("\nCultural Context: {cultural}"));
        }
        if let Some(historical) = self.historical_context {
            block.push_str(&format!("\nHistorical Context: {historical}"));
        }
        if let Some(sources) = self.additional_sources {
            block.push_str(&format!("\nAdditional Sources: {sources}"));
        }
        block
    }
}

/// Fallback policy when the evaluation call itself fails: re-analyze only
/// when the submitter explicitly asked for it.
pub fn fallback_should_reanalyze(feedback_type: FeedbackType) -> bool {
    matches!(feedback_type, FeedbackType::Reanalyze)
}

fn evaluation_prompt(context: &FeedbackContext<'_>) -> String {
    format!(
        "You are evaluating user feedback on a meme analysis. Determine if this feedback is \
         valid, adds meaningful value, and whether the meme should be re-analyzed with this new \
         context.\n\n\
         Feedback to evaluate:\n{}\n\n\
         Consider:\n\
         1. Does the feedback provide new, relevant information?\n\
         2. Does it add cultural, historical, or contextual insights?\n\
         3. Does it challenge the analysis with credible evidence?\n\
         4. Is it constructive and specific (not just \"I disagree\")?\n\
         5. Would incorporating this feedback improve the analysis?\n\n\
         Be generous - if the feedback adds ANY meaningful context or perspective, recommend \
         re-analysis.\n\n\
         IMPORTANT: Respond with ONLY a valid JSON object:\n\
         {{\n\
           \"is_valid\": true or false,\n\
           \"adds_value\": true or false,\n\
           \"should_reanalyze\": true or false,\n\
           \"reasoning\": \"brief explanation\"\n\
         }}",
        context.describe()
    )
}

/// Evaluate feedback with the text model. Errors propagate so the caller
/// can apply [`fallback_should_reanalyze`].
pub async fn evaluate<C: VisionClient>(
    client: &C,
    model: &str,
    context: &FeedbackContext<'_>,
) -> Result<FeedbackEvaluation, AnalysisError> {
    let messages = vec![ChatMessage::user(vec![ContentPart::text(
        evaluation_prompt(context),
    )])];
    let options = ChatOptions::json(model, EVALUATION_MAX_TOKENS, EVALUATION_TEMPERATURE);

    let response = client.chat(&messages, &options).await?;
    let value = extract_json(&response).map_err(|e| match e {
        JsonExtractError::NoJsonFound => {
            AnalysisError::InvalidResponse("no JSON found in evaluation response".to_string())
        }
        JsonExtractError::Parse(msg) => AnalysisError::InvalidResponse(msg),
    })?;
    let evaluation: FeedbackEvaluation =
        serde_json::from_value(value).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

    tracing::info!(
        is_valid = evaluation.is_valid,
        adds_value = evaluation.adds_value,
        should_reanalyze = evaluation.should_reanalyze,
        "Feedback evaluation complete"
    );
    Ok(evaluation)
}
