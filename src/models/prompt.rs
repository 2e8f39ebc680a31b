use chrono::{DateTime, Utc};
use serde::Serialize;

/// A versioned prompt text, keyed by logical name.
///
/// Exactly one version per name carries `is_current = true`; version numbers
/// increase monotonically within a name.
#[derive(Debug, Clone, Serialize)]
pub struct PromptRecord {
    pub id: String,
    pub name: String,
    pub version_name: String,
    pub version_number: i64,
    pub description: Option<String>,
    pub prompt_text: String,
    pub is_active: bool,
    pub is_current: bool,
    pub parent_version_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
