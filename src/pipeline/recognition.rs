//! Recognition gate — decides whether an image is a meme before spending
//! the more expensive claim-analysis call.

use serde::{Deserialize, Serialize};

use super::confidence::{in_valid_range, normalize_confidence};
use super::json_extract::{extract_json, JsonExtractError};
use super::prompts::build_recognition_prompt;
use super::{AnalysisError, ImagePayload};
use crate::llm::{ChatMessage, ChatOptions, ContentPart, VisionClient};

/// Recognition confidence strictly below this rejects the image.
/// Fixed policy constant, not learned.
pub const RECOGNITION_CONFIDENCE_THRESHOLD: u8 = 50;

const RECOGNITION_MAX_TOKENS: u32 = 1500;
const RECOGNITION_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionCharacteristics {
    pub has_text_overlay: bool,
    pub has_recognizable_template: bool,
    pub has_humorous_intent: bool,
    pub has_viral_patterns: bool,
    pub has_cultural_context: bool,
}

/// Validated recognition result; `confidence` is normalized to 0-100.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionOutcome {
    pub is_meme: bool,
    pub confidence: u8,
    pub reasoning: String,
    pub characteristics: RecognitionCharacteristics,
    pub rejection_reasons: Vec<String>,
}

impl RecognitionOutcome {
    pub fn passes_gate(&self) -> bool {
        self.confidence >= RECOGNITION_CONFIDENCE_THRESHOLD
    }
}

/// Wire shape of the model response, before validation.
#[derive(Debug, Deserialize)]
struct RawRecognition {
    is_meme: bool,
    confidence: f64,
    reasoning: String,
    characteristics: RecognitionCharacteristics,
    #[serde(default)]
    rejection_reasons: Vec<String>,
}

/// Run the recognition call and validate its response.
///
/// `prompt_text` is the editable prompt body (registry version or hardcoded
/// fallback); the JSON format instructions are always appended.
pub async fn recognize<C: VisionClient>(
    client: &C,
    prompt_text: &str,
    model: &str,
    image: &ImagePayload,
) -> Result<RecognitionOutcome, AnalysisError> {
    let prompt = build_recognition_prompt(prompt_text);
    let messages = vec![ChatMessage::user(vec![
        ContentPart::text(prompt),
        ContentPart::image(image.as_str()),
    ])];
    let options = ChatOptions::json(model, RECOGNITION_MAX_TOKENS, RECOGNITION_TEMPERATURE);

    let response = client.chat(&messages, &options).await?;
    let raw = parse_recognition(&response)?;

    let outcome = validate_recognition(raw)?;
    tracing::info!(
        is_meme = outcome.is_meme,
        confidence = outcome.confidence,
        "Meme recognition complete"
    );
    Ok(outcome)
}

fn parse_recognition(response: &str) -> Result<RawRecognition, AnalysisError> {
    let value = extract_json(response).map_err(|e| match e {
        JsonExtractError::NoJsonFound => {
            AnalysisError::InvalidResponse("no JSON found in recognition response".to_string())
        }
        JsonExtractError::Parse(msg) => AnalysisError::InvalidResponse(msg),
    })?;
    serde_json::from_value(value).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
}

fn validate_recognition(raw: RawRecognition) -> Result<RecognitionOutcome, AnalysisError> {
    if !in_valid_range(raw.confidence) {
        return Err(AnalysisError::InvalidResponse(format!(
            "recognition confidence out of range: {}",
            raw.confidence
        )));
    }
    Ok(RecognitionOutcome {
        is_meme: raw.is_meme,
        confidence: normalize_confidence(raw.confidence),
        reasoning: raw.reasoning,
        characteristics: raw.characteristics,
        rejection_reasons: raw.rejection_reasons,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::MockVisionClient;

    pub(crate) fn recognition_json(confidence: f64) -> String {
        format!(
            r#"{{
              "is_meme": {},
              "confidence": {confidence},
              "reasoning": "Impact-font caption over a reaction image.",
              "characteristics": {{
                "has_text_overlay": true,
                "has_recognizable_template": true,
                "has_humorous_intent": true,
                "has_viral_patterns": false,
                "has_cultural_context": true
              }},
              "rejection_reasons": []
            }}"#,
            confidence >= 50.0
        )
    }

    pub(crate) fn rejection_json() -> String {
        r#"{
          "is_meme": false,
          "confidence": 30,
          "reasoning": "The image is a stock photograph with no caption.",
          "characteristics": {
            "has_text_overlay": false,
            "has_recognizable_template": false,
            "has_humorous_intent": false,
            "has_viral_patterns": false,
            "has_cultural_context": false
          },
          "rejection_reasons": [
            "No text overlay detected",
            "Appears to be original photography"
          ]
        }"#
        .to_string()
    }

    fn payload() -> ImagePayload {
        ImagePayload::from_url("https://i.redd.it/test.jpg").unwrap()
    }

    #[tokio::test]
    async fn high_confidence_passes_gate() {
        let client = MockVisionClient::new().with_response(&recognition_json(85.0));
        let outcome = recognize(&client, "base prompt", "grok-2-vision-latest", &payload())
            .await
            .unwrap();
        assert!(outcome.is_meme);
        assert_eq!(outcome.confidence, 85);
        assert!(outcome.passes_gate());
    }

    #[tokio::test]
    async fn low_confidence_fails_gate_with_reasons() {
        let client = MockVisionClient::new().with_response(&rejection_json());
        let outcome = recognize(&client, "base prompt", "grok-2-vision-latest", &payload())
            .await
            .unwrap();
        assert!(!outcome.passes_gate());
        assert_eq!(outcome.rejection_reasons.len(), 2);
    }

    #[tokio::test]
    async fn threshold_is_inclusive_at_fifty() {
        let client = MockVisionClient::new().with_response(&recognition_json(50.0));
        let outcome = recognize(&client, "p", "grok-2-vision-latest", &payload())
            .await
            .unwrap();
        assert!(outcome.passes_gate());
    }

    #[tokio::test]
    async fn fractional_confidence_is_normalized() {
        let client = MockVisionClient::new().with_response(&recognition_json(0.82));
        let outcome = recognize(&client, "p", "grok-2-vision-latest", &payload())
            .await
            .unwrap();
        assert_eq!(outcome.confidence, 82);
    }

    #[tokio::test]
    async fn fenced_response_still_parses() {
        let fenced = format!("Here you go:\n```json\n{}\n```", recognition_json(90.0));
        let client = MockVisionClient::new().with_response(&fenced);
        let outcome = recognize(&client, "p", "grok-2-vision-latest", &payload())
            .await
            .unwrap();
        assert_eq!(outcome.confidence, 90);
    }

    #[tokio::test]
    async fn missing_field_is_invalid_response() {
        let client = MockVisionClient::new().with_response(r#"{"is_meme": true}"#);
        let err = recognize(&client, "p", "grok-2-vision-latest", &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn out_of_range_confidence_is_invalid_response() {
        let client = MockVisionClient::new().with_response(&recognition_json(250.0));
        let err = recognize(&client, "p", "grok-2-vision-latest", &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn prose_only_response_is_invalid_response() {
        let client = MockVisionClient::new().with_response("Yes, that is a meme.");
        let err = recognize(&client, "p", "grok-2-vision-latest", &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponse(_)));
    }
}
