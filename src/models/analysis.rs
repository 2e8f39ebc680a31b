use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Verdict;

/// Sentinel verdict for rows imported from Reddit but not yet analyzed.
pub const PENDING_VERDICT: &str = "PENDING";

/// A citation attached to a fact-checked claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub publisher: String,
}

/// One factual assertion extracted from a meme, independently verdicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    pub verdict: Verdict,
    /// 0-100, normalized at validation time.
    pub confidence: u8,
    pub explanation: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// A persisted meme analysis row.
///
/// `verdict` holds a storage-form [`Verdict`] string, or [`PENDING_VERDICT`]
/// for bulk-imported rows awaiting their first analysis.
#[derive(Debug, Clone, Serialize)]
pub struct MemeRecord {
    pub id: String,
    pub image_url: String,
    pub title: Option<String>,
    /// Provenance link (e.g. the Reddit permalink) for imported rows.
    pub source_url: Option<String>,
    pub verdict: String,
    pub confidence: u8,
    pub overall_explanation: Option<String>,
    pub claims: Vec<Claim>,
    pub sources: Vec<Source>,
    pub feedback_incorporated: bool,
    pub analyzed_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MemeRecord {
    pub fn is_pending(&self) -> bool {
        self.verdict == PENDING_VERDICT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_deserializes_without_sources() {
        let json = r#"{"text":"The earth is round","verdict":"factual","confidence":95,"explanation":"Well established."}"#;
        let claim: Claim = serde_json::from_str(json).unwrap();
        assert!(claim.sources.is_empty());
        assert_eq!(claim.verdict, Verdict::Factual);
    }

    #[test]
    fn pending_sentinel_is_not_a_verdict() {
        assert!(PENDING_VERDICT.parse::<Verdict>().is_err());
    }
}
