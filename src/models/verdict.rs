use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::InvalidEnumValue;

/// Closed truthfulness/tone taxonomy for memes and individual claims.
///
/// Serialized snake_case on the LLM wire; stored UPPERCASE in the database
/// so gallery filters stay exact-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    // Truthfulness & accuracy
    Factual,
    Misleading,
    OutOfContext,
    Distorted,
    Misinformation,
    Lies,
    Unverifiable,
    // Tone
    Sarcasm,
    Satire,
    Humor,
    Wholesome,
    DarkHumor,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Factual => "factual",
            Self::Misleading => "misleading",
            Self::OutOfContext => "out_of_context",
            Self::Distorted => "distorted",
            Self::Misinformation => "misinformation",
            Self::Lies => "lies",
            Self::Unverifiable => "unverifiable",
            Self::Sarcasm => "sarcasm",
            Self::Satire => "satire",
            Self::Humor => "humor",
            Self::Wholesome => "wholesome",
            Self::DarkHumor => "dark_humor",
        }
    }

    /// The normalized form written to the `verdict` column.
    pub fn storage_str(&self) -> &'static str {
        match self {
            Self::Factual => "FACTUAL",
            Self::Misleading => "MISLEADING",
            Self::OutOfContext => "OUT_OF_CONTEXT",
            Self::Distorted => "DISTORTED",
            Self::Misinformation => "MISINFORMATION",
            Self::Lies => "LIES",
            Self::Unverifiable => "UNVERIFIABLE",
            Self::Sarcasm => "SARCASM",
            Self::Satire => "SATIRE",
            Self::Humor => "HUMOR",
            Self::Wholesome => "WHOLESOME",
            Self::DarkHumor => "DARK_HUMOR",
        }
    }

    pub fn all() -> &'static [Verdict] {
        &[
            Self::Factual,
            Self::Misleading,
            Self::OutOfContext,
            Self::Distorted,
            Self::Misinformation,
            Self::Lies,
            Self::Unverifiable,
            Self::Sarcasm,
            Self::Satire,
            Self::Humor,
            Self::Wholesome,
            Self::DarkHumor,
        ]
    }
}

impl FromStr for Verdict {
    type Err = InvalidEnumValue;

    /// Case-insensitive: accepts both wire form and storage form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::all()
            .iter()
            .find(|v| v.as_str() == lowered)
            .copied()
            .ok_or_else(|| InvalidEnumValue {
                field: "verdict",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_has_twelve_categories() {
        assert_eq!(Verdict::all().len(), 12);
    }

    #[test]
    fn round_trips_through_wire_form() {
        for v in Verdict::all() {
            assert_eq!(v.as_str().parse::<Verdict>().unwrap(), *v);
        }
    }

    #[test]
    fn round_trips_through_storage_form() {
        for v in Verdict::all() {
            assert_eq!(v.storage_str().parse::<Verdict>().unwrap(), *v);
        }
    }

    #[test]
    fn storage_form_is_uppercase_wire_form() {
        for v in Verdict::all() {
            assert_eq!(v.storage_str(), v.as_str().to_ascii_uppercase());
        }
    }

    #[test]
    fn rejects_unknown_value() {
        assert!("propaganda".parse::<Verdict>().is_err());
        assert!("".parse::<Verdict>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Verdict::OutOfContext).unwrap();
        assert_eq!(json, "\"out_of_context\"");
        let back: Verdict = serde_json::from_str("\"dark_humor\"").unwrap();
        assert_eq!(back, Verdict::DarkHumor);
    }
}
