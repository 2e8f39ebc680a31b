use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InvalidEnumValue;

/// How the submitter framed their feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Clarify,
    Dispute,
    Reanalyze,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clarify => "clarify",
            Self::Dispute => "dispute",
            Self::Reanalyze => "reanalyze",
        }
    }
}

impl FromStr for FeedbackType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clarify" => Ok(Self::Clarify),
            "dispute" => Ok(Self::Dispute),
            "reanalyze" => Ok(Self::Reanalyze),
            _ => Err(InvalidEnumValue {
                field: "feedback_type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Pending,
    Incorporated,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Incorporated => "incorporated",
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "incorporated" => Ok(Self::Incorporated),
            _ => Err(InvalidEnumValue {
                field: "feedback_status",
                value: s.to_string(),
            }),
        }
    }
}

/// User-submitted context tied to an existing meme analysis.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub meme_id: String,
    pub feedback_type: FeedbackType,
    pub user_context: String,
    pub cultural_context: Option<String>,
    pub historical_context: Option<String>,
    pub additional_sources: Option<String>,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_type_round_trips() {
        for t in [
            FeedbackType::Clarify,
            FeedbackType::Dispute,
            FeedbackType::Reanalyze,
        ] {
            assert_eq!(t.as_str().parse::<FeedbackType>().unwrap(), t);
        }
    }

    #[test]
    fn feedback_type_rejects_unknown() {
        assert!("praise".parse::<FeedbackType>().is_err());
    }
}
