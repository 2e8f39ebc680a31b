//! Claim analysis — the fact-checking call for images that passed the
//! recognition gate.

use std::str::FromStr;

use serde::Deserialize;

use super::confidence::{in_valid_range, normalize_confidence};
use super::json_extract::{extract_json, JsonExtractError};
use super::prompts::build_analysis_prompt;
use super::{AnalysisError, ImagePayload};
use crate::llm::{ChatMessage, ChatOptions, ContentPart, VisionClient};
use crate::models::{Claim, Source, Verdict};

const ANALYSIS_MAX_TOKENS: u32 = 4000;
const ANALYSIS_TEMPERATURE: f32 = 0.3;

/// Validated analysis result, ready to persist.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub verdict: Verdict,
    pub confidence: u8,
    pub claims: Vec<Claim>,
}

impl AnalysisOutcome {
    /// Claim explanations concatenated for the gallery summary column.
    pub fn overall_explanation(&self) -> String {
        self.claims
            .iter()
            .map(|c| c.explanation.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All claim sources, flattened in claim order.
    pub fn flattened_sources(&self) -> Vec<Source> {
        self.claims.iter().flat_map(|c| c.sources.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    overall_verdict: String,
    confidence: f64,
    #[serde(default)]
    claims: Vec<RawClaim>,
}

#[derive(Debug, Deserialize)]
struct RawClaim {
    text: String,
    verdict: String,
    confidence: f64,
    explanation: String,
    #[serde(default)]
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    title: String,
    url: String,
    #[serde(default)]
    publisher: String,
}

/// Run the claim-analysis call and validate its response.
pub async fn analyze_claims<C: VisionClient>(
    client: &C,
    prompt_text: &str,
    model: &str,
    image: &ImagePayload,
    additional_context: Option<&str>,
) -> Result<AnalysisOutcome, AnalysisError> {
    let prompt = build_analysis_prompt(prompt_text, additional_context);
    let messages = vec![ChatMessage::user(vec![
        ContentPart::text(prompt),
        ContentPart::image(image.as_str()),
    ])];
    let options = ChatOptions::json(model, ANALYSIS_MAX_TOKENS, ANALYSIS_TEMPERATURE);

    let response = client.chat(&messages, &options).await?;
    let raw = parse_analysis(&response)?;

    let outcome = validate_analysis(raw)?;
    tracing::info!(
        verdict = %outcome.verdict,
        confidence = outcome.confidence,
        claim_count = outcome.claims.len(),
        "Claim analysis complete"
    );
    Ok(outcome)
}

fn parse_analysis(response: &str) -> Result<RawAnalysis, AnalysisError> {
    let value = extract_json(response).map_err(|e| match e {
        JsonExtractError::NoJsonFound => {
            AnalysisError::InvalidResponse("no JSON found in analysis response".to_string())
        }
        JsonExtractError::Parse(msg) => AnalysisError::InvalidResponse(msg),
    })?;
    serde_json::from_value(value).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
}

fn validate_analysis(raw: RawAnalysis) -> Result<AnalysisOutcome, AnalysisError> {
    let verdict = Verdict::from_str(&raw.overall_verdict)
        .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

    if !in_valid_range(raw.confidence) {
        return Err(AnalysisError::InvalidResponse(format!(
            "overall confidence out of range: {}",
            raw.confidence
        )));
    }

    if raw.claims.is_empty() {
        return Err(AnalysisError::InvalidResponse(
            "analysis returned no claims".to_string(),
        ));
    }

    let claims = raw
        .claims
        .into_iter()
        .map(validate_claim)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnalysisOutcome {
        verdict,
        confidence: normalize_confidence(raw.confidence),
        claims,
    })
}

fn validate_claim(raw: RawClaim) -> Result<Claim, AnalysisError> {
    let verdict = Verdict::from_str(&raw.verdict)
        .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

    if !in_valid_range(raw.confidence) {
        return Err(AnalysisError::InvalidResponse(format!(
            "claim confidence out of range: {}",
            raw.confidence
        )));
    }

    let sources = raw
        .sources
        .into_iter()
        .map(validate_source)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Claim {
        text: raw.text,
        verdict,
        confidence: normalize_confidence(raw.confidence),
        explanation: raw.explanation,
        sources,
    })
}

fn validate_source(raw: RawSource) -> Result<Source, AnalysisError> {
    let parsed = reqwest::Url::parse(&raw.url)
        .map_err(|_| AnalysisError::InvalidResponse(format!("malformed source URL: {}", raw.url)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AnalysisError::InvalidResponse(format!(
            "source URL must be http(s): {}",
            raw.url
        )));
    }
    Ok(Source {
        title: raw.title,
        url: raw.url,
        publisher: raw.publisher,
    })
}
