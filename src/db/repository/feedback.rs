use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{FeedbackRecord, FeedbackStatus, FeedbackType};

pub fn insert_feedback(conn: &Connection, record: &FeedbackRecord) -> Result<(), DatabaseError> {
    let result = conn.execute(
        "INSERT INTO meme_feedback (id, meme_id, feedback_type, user_context,
         cultural_context, historical_context, additional_sources, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id,
            record.meme_id,
            record.feedback_type.as_str(),
            record.user_context,
            record.cultural_context,
            record.historical_context,
            record.additional_sources,
            record.status.as_str(),
            record.created_at.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        // FK failure means the meme row is gone
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DatabaseError::NotFound {
                entity_type: "MemeAnalysis".into(),
                id: record.meme_id.clone(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Feedback entries for one meme, newest first.
pub fn list_feedback(conn: &Connection, meme_id: &str) -> Result<Vec<FeedbackRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, meme_id, feedback_type, user_context, cultural_context,
         historical_context, additional_sources, status, created_at
         FROM meme_feedback WHERE meme_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt
        .query_map(params![meme_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(id, meme_id, ftype, user, cultural, historical, extra, status, created)| {
                Ok(FeedbackRecord {
                    feedback_type: FeedbackType::from_str(&ftype).map_err(|e| {
                        DatabaseError::CorruptJson {
                            column: "feedback_type".into(),
                            reason: e.to_string(),
                        }
                    })?,
                    status: FeedbackStatus::from_str(&status).map_err(|e| {
                        DatabaseError::CorruptJson {
                            column: "status".into(),
                            reason: e.to_string(),
                        }
                    })?,
                    created_at: DateTime::parse_from_rfc3339(&created)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|e| DatabaseError::CorruptJson {
                            column: "created_at".into(),
                            reason: e.to_string(),
                        })?,
                    id,
                    meme_id,
                    user_context: user,
                    cultural_context: cultural,
                    historical_context: historical,
                    additional_sources: extra,
                })
            },
        )
        .collect()
}

pub fn update_feedback_status(
    conn: &Connection,
    id: &str,
    status: FeedbackStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE meme_feedback SET status = ?2 WHERE id = ?1",
        params![id, status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Feedback".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
