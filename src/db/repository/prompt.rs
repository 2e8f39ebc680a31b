use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::PromptRecord;
use crate::pipeline::prompts::{DEFAULT_ANALYSIS_PROMPT, DEFAULT_RECOGNITION_PROMPT};

const PROMPT_COLUMNS: &str = "id, name, version_name, version_number, description, prompt_text, \
     is_active, is_current, parent_version_id, created_at, updated_at";

/// Text of the current active version for a logical prompt name.
pub fn current_prompt_text(conn: &Connection, name: &str) -> Result<Option<String>, DatabaseError> {
    let text = conn
        .query_row(
            "SELECT prompt_text FROM prompts
             WHERE name = ?1 AND is_current = 1 AND is_active = 1
             LIMIT 1",
            params![name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(text)
}

pub fn list_prompts(conn: &Connection) -> Result<Vec<PromptRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROMPT_COLUMNS} FROM prompts ORDER BY name, version_number DESC"
    ))?;
    let rows = stmt
        .query_map([], row_to_prompt)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(prompt_from_raw).collect()
}

pub fn get_prompt(conn: &Connection, id: &str) -> Result<Option<PromptRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = ?1"))?;
    let result = stmt.query_row(params![id], row_to_prompt);
    match result {
        Ok(raw) => Ok(Some(prompt_from_raw(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Edit an existing version in place (text, description, version label).
pub fn update_prompt(
    conn: &Connection,
    id: &str,
    prompt_text: &str,
    description: Option<&str>,
    version_name: Option<&str>,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE prompts SET prompt_text = ?2,
         description = COALESCE(?3, description),
         version_name = COALESCE(?4, version_name),
         updated_at = ?5
         WHERE id = ?1",
        params![
            id,
            prompt_text,
            description,
            version_name,
            Utc::now().to_rfc3339()
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Prompt".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Create a new version for a prompt name and make it the current one.
///
/// Version numbers increase monotonically per name; every older version has
/// its `is_current` flag cleared in the same transaction.
pub fn create_prompt_version(
    conn: &Connection,
    name: &str,
    version_name: &str,
    prompt_text: &str,
    description: Option<&str>,
    parent_version_id: Option<&str>,
) -> Result<PromptRecord, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let next_version: i64 = tx.query_row(
        "SELECT COALESCE(MAX(version_number), 0) + 1 FROM prompts WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;

    tx.execute(
        "UPDATE prompts SET is_current = 0 WHERE name = ?1",
        params![name],
    )?;

    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now();
    tx.execute(
        "INSERT INTO prompts (id, name, version_name, version_number, description,
         prompt_text, is_active, is_current, parent_version_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 1, ?7, ?8)",
        params![
            id,
            name,
            version_name,
            next_version,
            description,
            prompt_text,
            parent_version_id,
            created_at.to_rfc3339(),
        ],
    )?;

    tx.commit()?;

    Ok(PromptRecord {
        id,
        name: name.to_string(),
        version_name: version_name.to_string(),
        version_number: next_version,
        description: description.map(str::to_string),
        prompt_text: prompt_text.to_string(),
        is_active: true,
        is_current: true,
        parent_version_id: parent_version_id.map(str::to_string),
        created_at,
        updated_at: None,
    })
}

/// Seed the hardcoded default prompts for any name with no stored version.
pub fn ensure_default_prompts(conn: &Connection) -> Result<(), DatabaseError> {
    for default in [&DEFAULT_RECOGNITION_PROMPT, &DEFAULT_ANALYSIS_PROMPT] {
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM prompts WHERE name = ?1",
            params![default.name],
            |row| row.get(0),
        )?;
        if existing == 0 {
            tracing::info!(name = default.name, "Seeding default prompt");
            create_prompt_version(
                conn,
                default.name,
                default.version_name,
                default.prompt_text,
                Some(default.description),
                None,
            )?;
        }
    }
    Ok(())
}

// ── Row mapping ─────────────────────────────────────────────

struct RawPrompt {
    id: String,
    name: String,
    version_name: String,
    version_number: i64,
    description: Option<String>,
    prompt_text: String,
    is_active: i32,
    is_current: i32,
    parent_version_id: Option<String>,
    created_at: String,
    updated_at: Option<String>,
}

fn row_to_prompt(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPrompt> {
    Ok(RawPrompt {
        id: row.get(0)?,
        name: row.get(1)?,
        version_name: row.get(2)?,
        version_number: row.get(3)?,
        description: row.get(4)?,
        prompt_text: row.get(5)?,
        is_active: row.get(6)?,
        is_current: row.get(7)?,
        parent_version_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn prompt_from_raw(raw: RawPrompt) -> Result<PromptRecord, DatabaseError> {
    let parse = |s: &str| {
        DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| DatabaseError::CorruptJson {
                column: "created_at".into(),
                reason: e.to_string(),
            })
    };
    Ok(PromptRecord {
        created_at: parse(&raw.created_at)?,
        updated_at: raw.updated_at.as_deref().map(parse).transpose()?,
        id: raw.id,
        name: raw.name,
        version_name: raw.version_name,
        version_number: raw.version_number,
        description: raw.description,
        prompt_text: raw.prompt_text,
        is_active: raw.is_active != 0,
        is_current: raw.is_current != 0,
        parent_version_id: raw.parent_version_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::pipeline::prompts::{ANALYSIS_PROMPT_NAME, RECOGNITION_PROMPT_NAME};

    #[test]
    fn seeding_creates_one_version_per_name() {
        let conn = open_memory_database().unwrap();
        ensure_default_prompts(&conn).unwrap();

        let prompts = list_prompts(&conn).unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|p| p.version_number == 1 && p.is_current));

        // Idempotent
        ensure_default_prompts(&conn).unwrap();
        assert_eq!(list_prompts(&conn).unwrap().len(), 2);
    }

    #[test]
    fn current_prompt_text_reads_seeded_default() {
        let conn = open_memory_database().unwrap();
        ensure_default_prompts(&conn).unwrap();

        let text = current_prompt_text(&conn, ANALYSIS_PROMPT_NAME).unwrap();
        assert!(text.is_some());
        assert!(current_prompt_text(&conn, "no_such_prompt").unwrap().is_none());
    }

    #[test]
    fn new_version_bumps_number_and_flips_current() {
        let conn = open_memory_database().unwrap();
        ensure_default_prompts(&conn).unwrap();

        let v2 = create_prompt_version(
            &conn,
            RECOGNITION_PROMPT_NAME,
            "Recognition.v2",
            "Updated recognition instructions",
            None,
            None,
        )
        .unwrap();
        assert_eq!(v2.version_number, 2);
        assert!(v2.is_current);

        let prompts = list_prompts(&conn).unwrap();
        let recognition: Vec<_> = prompts
            .iter()
            .filter(|p| p.name == RECOGNITION_PROMPT_NAME)
            .collect();
        assert_eq!(recognition.len(), 2);
        let current: Vec<_> = recognition.iter().filter(|p| p.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].version_number, 2);

        let text = current_prompt_text(&conn, RECOGNITION_PROMPT_NAME)
            .unwrap()
            .unwrap();
        assert_eq!(text, "Updated recognition instructions");
    }

    #[test]
    fn update_edits_in_place() {
        let conn = open_memory_database().unwrap();
        ensure_default_prompts(&conn).unwrap();
        let id = list_prompts(&conn).unwrap()[0].id.clone();

        update_prompt(&conn, &id, "Edited text", Some("Edited"), None).unwrap();
        let loaded = get_prompt(&conn, &id).unwrap().unwrap();
        assert_eq!(loaded.prompt_text, "Edited text");
        assert_eq!(loaded.description.as_deref(), Some("Edited"));
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn update_missing_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = update_prompt(&conn, "ghost", "x", None, None).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
