//! Default prompt texts and the fixed JSON format instructions.
//!
//! The editable part of each prompt lives in the `prompts` table (seeded
//! from these defaults); the format instructions are appended at call time
//! and are not editable, so the response schema stays stable across prompt
//! edits.

pub const RECOGNITION_PROMPT_NAME: &str = "meme_recognition";
pub const ANALYSIS_PROMPT_NAME: &str = "meme_analysis";

/// A hardcoded fallback prompt, also used to seed the registry.
pub struct DefaultPrompt {
    pub name: &'static str,
    pub version_name: &'static str,
    pub description: &'static str,
    pub prompt_text: &'static str,
}

pub const DEFAULT_RECOGNITION_PROMPT: DefaultPrompt = DefaultPrompt {
    name: RECOGNITION_PROMPT_NAME,
    version_name: "Recognition.v1",
    description: "Decides whether an uploaded image is a meme before the full analysis runs",
    prompt_text: "\
You are an expert at detecting whether an image is a meme or not. Analyze this image using a \
multi-layer classification system:

**Layer 1: Visual structure**
- Text overlay (top/bottom caption format, Impact-style font, outlined text)
- Recognizable meme template formats
- Aspect ratios and compression artifacts typical of memes

**Layer 2: Cultural context**
- Pop culture or internet culture references
- Meme-specific language patterns (\"When you...\", \"Nobody:\", \"POV:\")

**Layer 3: Viral patterns**
- Watermarks from meme generators
- Signs of being screenshot or re-shared multiple times

**Layer 4: Content semantics**
- Humor, irony, or sarcasm in the text-image relationship
- Juxtaposition between image and text creating comedic meaning

**Confidence scoring:**
- High (80-100): clear meme with multiple indicators
- Medium (50-79): likely a meme but missing some typical characteristics
- Low (0-49): not a meme — regular photo, infographic, document, etc.

When the image is NOT a meme, provide specific rejection reasons such as \
\"No text overlay detected\", \"Appears to be original photography\", \
\"Looks like an infographic or educational content\". \
Be thorough but decisive.",
};

pub const DEFAULT_ANALYSIS_PROMPT: DefaultPrompt = DefaultPrompt {
    name: ANALYSIS_PROMPT_NAME,
    version_name: "Meme-Analysis.v1",
    description: "Main prompt for extracting and fact-checking the claims made in a meme",
    prompt_text: "\
You are an unbiased meme analysis and fact-checking expert. Analyze this meme image and \
categorize it using this taxonomy:

**Truthfulness categories:** factual, misleading, out_of_context, distorted, misinformation, \
lies, unverifiable.
**Tone categories:** sarcasm, satire, humor, wholesome, dark_humor.

Your task:
1. Identify every factual claim made in the meme (text, imagery, implications).
2. Verify each claim against credible, diverse sources. Prefer primary sources, official \
documents and data over media interpretation, and dedicated fact-checking organizations \
(FactCheck.org, Snopes, PolitiFact, Reuters Fact Check, Know Your Meme for meme provenance).
3. Determine the single category that best describes the meme's intent and tone.
4. For factual claims, provide REAL, verifiable sources with actual URLs. Sources are \
optional for pure humor or satire.
5. Score confidence by the strength of the evidence.

Be thorough, stay neutral on politically charged claims, and provide concise explanations.",
};

/// Appended to the recognition prompt. Keys mirror `RawRecognition`.
pub const RECOGNITION_FORMAT_INSTRUCTIONS: &str = "\
IMPORTANT: You MUST respond with ONLY a valid JSON object (no markdown, no explanation) in this exact format:
{
  \"is_meme\": true or false,
  \"confidence\": number between 0-100,
  \"reasoning\": \"your detailed explanation\",
  \"characteristics\": {
    \"has_text_overlay\": true or false,
    \"has_recognizable_template\": true or false,
    \"has_humorous_intent\": true or false,
    \"has_viral_patterns\": true or false,
    \"has_cultural_context\": true or false
  },
  \"rejection_reasons\": [\"reason1\", \"reason2\"] or an empty array if it IS a meme
}";

/// Appended to the analysis prompt. Keys mirror `RawAnalysis`.
pub const ANALYSIS_FORMAT_INSTRUCTIONS: &str = "\
IMPORTANT: You MUST respond with ONLY a valid JSON object (no markdown, no explanation) in this exact format:
{
  \"overall_verdict\": \"one of: factual, misleading, out_of_context, distorted, misinformation, lies, unverifiable, sarcasm, satire, humor, wholesome, dark_humor\",
  \"confidence\": number between 0-100,
  \"claims\": [
    {
      \"text\": \"the specific claim\",
      \"verdict\": \"same options as overall_verdict\",
      \"confidence\": number between 0-100,
      \"explanation\": \"brief explanation\",
      \"sources\": [{\"title\": \"source title\", \"url\": \"https://...\", \"publisher\": \"publisher name\"}] or []
    }
  ]
}";

pub fn build_recognition_prompt(base: &str) -> String {
    format!("{base}\n\n{RECOGNITION_FORMAT_INSTRUCTIONS}")
}

pub fn build_analysis_prompt(base: &str, additional_context: Option<&str>) -> String {
    let mut prompt = format!("{base}\n\n{ANALYSIS_FORMAT_INSTRUCTIONS}");
    if let Some(context) = additional_context {
        prompt.push_str(&format!(
            "\n\n**IMPORTANT: Human Feedback Context**\n\
             A human reviewer has provided the following additional context:\n\
             {context}\n\n\
             Please take this human interpretation into account."
        ));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_prompt_carries_format_block() {
        let prompt = build_recognition_prompt(DEFAULT_RECOGNITION_PROMPT.prompt_text);
        assert!(prompt.contains("is_meme"));
        assert!(prompt.contains("rejection_reasons"));
    }

    #[test]
    fn analysis_prompt_appends_context_when_present() {
        let without = build_analysis_prompt("base", None);
        assert!(!without.contains("Human Feedback Context"));

        let with = build_analysis_prompt("base", Some("The photo is from 2015."));
        assert!(with.contains("Human Feedback Context"));
        assert!(with.contains("The photo is from 2015."));
        // Context goes after the format instructions
        assert!(with.find("overall_verdict").unwrap() < with.find("2015").unwrap());
    }

    #[test]
    fn format_instructions_list_every_verdict() {
        for v in crate::models::Verdict::all() {
            assert!(
                ANALYSIS_FORMAT_INSTRUCTIONS.contains(v.as_str()),
                "missing {v}"
            );
        }
    }
}
