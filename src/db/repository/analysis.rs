use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{Claim, MemeRecord, Source};

const MEME_COLUMNS: &str = "id, image_url, title, source_url, verdict, confidence, \
     overall_explanation, claims, sources, feedback_incorporated, analyzed_at, updated_at";

pub fn insert_analysis(conn: &Connection, record: &MemeRecord) -> Result<(), DatabaseError> {
    // App-level duplicate check: the same image payload is analyzed once.
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM meme_analyses WHERE image_url = ?1 LIMIT 1",
            params![record.image_url],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(DatabaseError::ConstraintViolation(
            "meme with this image has already been analyzed".to_string(),
        ));
    }

    let result = conn.execute(
        "INSERT INTO meme_analyses (id, image_url, title, source_url, verdict, confidence,
         overall_explanation, claims, sources, feedback_incorporated, analyzed_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            record.id,
            record.image_url,
            record.title,
            record.source_url,
            record.verdict,
            record.confidence,
            record.overall_explanation,
            to_json(&record.claims, "claims")?,
            to_json(&record.sources, "sources")?,
            record.feedback_incorporated as i32,
            record.analyzed_at.to_rfc3339(),
            record.updated_at.map(|t| t.to_rfc3339()),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DatabaseError::ConstraintViolation(format!(
                "meme with image_url already exists: {}",
                record.image_url
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// Overwrite the analysis result on an existing row. Never inserts.
pub fn update_analysis_result(
    conn: &Connection,
    id: &str,
    verdict: &str,
    confidence: u8,
    overall_explanation: &str,
    claims: &[Claim],
    sources: &[Source],
    feedback_incorporated: bool,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE meme_analyses SET verdict = ?2, confidence = ?3, overall_explanation = ?4,
         claims = ?5, sources = ?6, feedback_incorporated = ?7, updated_at = ?8
         WHERE id = ?1",
        params![
            id,
            verdict,
            confidence,
            overall_explanation,
            to_json(&claims, "claims")?,
            to_json(&sources, "sources")?,
            feedback_incorporated as i32,
            Utc::now().to_rfc3339(),
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "MemeAnalysis".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn get_analysis(conn: &Connection, id: &str) -> Result<Option<MemeRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEME_COLUMNS} FROM meme_analyses WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id], row_to_raw);
    match result {
        Ok(raw) => Ok(Some(record_from_raw(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Newest-first page of analyses with an optional exact-match verdict filter.
/// Returns the page plus the total row count for that filter.
pub fn list_analyses(
    conn: &Connection,
    verdict_filter: Option<&str>,
    page: u32,
    per_page: u32,
) -> Result<(Vec<MemeRecord>, i64), DatabaseError> {
    let offset = (page.saturating_sub(1) as i64) * per_page as i64;

    let (total, raws) = match verdict_filter {
        Some(filter) => {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM meme_analyses WHERE verdict = ?1",
                params![filter],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEME_COLUMNS} FROM meme_analyses WHERE verdict = ?1
                 ORDER BY analyzed_at DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(params![filter, per_page, offset], row_to_raw)?
                .collect::<Result<Vec<_>, _>>()?;
            (total, rows)
        }
        None => {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM meme_analyses", [], |row| row.get(0))?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEME_COLUMNS} FROM meme_analyses
                 ORDER BY analyzed_at DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(params![per_page, offset], row_to_raw)?
                .collect::<Result<Vec<_>, _>>()?;
            (total, rows)
        }
    };

    let records = raws
        .into_iter()
        .map(record_from_raw)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((records, total))
}

pub fn delete_analysis(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let rows = conn.execute("DELETE FROM meme_analyses WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

pub fn count_analyses(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM meme_analyses", [], |row| row.get(0))?;
    Ok(count)
}

/// Every stored image URL, for building the import duplicate index.
pub fn existing_image_urls(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT image_url FROM meme_analyses")?;
    let urls = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(urls)
}

// ── Row mapping ─────────────────────────────────────────────

struct RawRow {
    id: String,
    image_url: String,
    title: Option<String>,
    source_url: Option<String>,
    verdict: String,
    confidence: i64,
    overall_explanation: Option<String>,
    claims: String,
    sources: String,
    feedback_incorporated: i32,
    analyzed_at: String,
    updated_at: Option<String>,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        image_url: row.get(1)?,
        title: row.get(2)?,
        source_url: row.get(3)?,
        verdict: row.get(4)?,
        confidence: row.get(5)?,
        overall_explanation: row.get(6)?,
        claims: row.get(7)?,
        sources: row.get(8)?,
        feedback_incorporated: row.get(9)?,
        analyzed_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn record_from_raw(raw: RawRow) -> Result<MemeRecord, DatabaseError> {
    Ok(MemeRecord {
        claims: from_json(&raw.claims, "claims")?,
        sources: from_json(&raw.sources, "sources")?,
        analyzed_at: parse_timestamp(&raw.analyzed_at, "analyzed_at")?,
        updated_at: raw
            .updated_at
            .as_deref()
            .map(|s| parse_timestamp(s, "updated_at"))
            .transpose()?,
        id: raw.id,
        image_url: raw.image_url,
        title: raw.title,
        source_url: raw.source_url,
        verdict: raw.verdict,
        confidence: raw.confidence.clamp(0, 100) as u8,
        overall_explanation: raw.overall_explanation,
        feedback_incorporated: raw.feedback_incorporated != 0,
    })
}

fn to_json<T: serde::Serialize>(value: &T, column: &str) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::CorruptJson {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str, column: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::CorruptJson {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

fn parse_timestamp(s: &str, column: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptJson {
            column: column.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Verdict, PENDING_VERDICT};

    pub(crate) fn sample_record(id: &str, image_url: &str, verdict: &str) -> MemeRecord {
        MemeRecord {
            id: id.to_string(),
            image_url: image_url.to_string(),
            title: None,
            source_url: None,
            verdict: verdict.to_string(),
            confidence: 85,
            overall_explanation: Some("Checks out.".to_string()),
            claims: vec![Claim {
                text: "Water is wet".to_string(),
                verdict: Verdict::Factual,
                confidence: 95,
                explanation: "Checks out.".to_string(),
                sources: vec![Source {
                    title: "Encyclopedia".to_string(),
                    url: "https://example.org/water".to_string(),
                    publisher: "Example".to_string(),
                }],
            }],
            sources: vec![],
            feedback_incorporated: false,
            analyzed_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let record = sample_record("m1", "https://i.redd.it/abc.jpg", "FACTUAL");
        insert_analysis(&conn, &record).unwrap();

        let loaded = get_analysis(&conn, "m1").unwrap().unwrap();
        assert_eq!(loaded.verdict, "FACTUAL");
        assert_eq!(loaded.claims.len(), 1);
        assert_eq!(loaded.claims[0].verdict, Verdict::Factual);
        assert_eq!(loaded.claims[0].sources[0].publisher, "Example");
        assert!(!loaded.feedback_incorporated);
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_analysis(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn duplicate_image_url_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        insert_analysis(&conn, &sample_record("m1", "https://x/a.jpg", "HUMOR")).unwrap();
        let err = insert_analysis(&conn, &sample_record("m2", "https://x/a.jpg", "HUMOR"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn update_overwrites_without_new_row() {
        let conn = open_memory_database().unwrap();
        insert_analysis(&conn, &sample_record("m1", "https://x/a.jpg", PENDING_VERDICT)).unwrap();

        let before = count_analyses(&conn).unwrap();
        update_analysis_result(
            &conn,
            "m1",
            "SATIRE",
            70,
            "Clearly satirical.",
            &[],
            &[],
            true,
        )
        .unwrap();
        let after = count_analyses(&conn).unwrap();

        assert_eq!(before, after);
        let loaded = get_analysis(&conn, "m1").unwrap().unwrap();
        assert_eq!(loaded.verdict, "SATIRE");
        assert!(loaded.feedback_incorporated);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn update_missing_row_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err =
            update_analysis_result(&conn, "ghost", "HUMOR", 50, "", &[], &[], false).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn list_filters_by_exact_verdict() {
        let conn = open_memory_database().unwrap();
        insert_analysis(&conn, &sample_record("m1", "https://x/a.jpg", "FACTUAL")).unwrap();
        insert_analysis(&conn, &sample_record("m2", "https://x/b.jpg", "SATIRE")).unwrap();
        insert_analysis(&conn, &sample_record("m3", "https://x/c.jpg", "FACTUAL")).unwrap();

        let (page, total) = list_analyses(&conn, Some("FACTUAL"), 1, 10).unwrap();
        assert_eq!(total, 2);
        assert!(page.iter().all(|m| m.verdict == "FACTUAL"));

        // Lowercase filter must not match — storage is normalized uppercase
        let (page, total) = list_analyses(&conn, Some("factual"), 1, 10).unwrap();
        assert_eq!(total, 0);
        assert!(page.is_empty());
    }

    #[test]
    fn list_paginates() {
        let conn = open_memory_database().unwrap();
        for i in 0..12 {
            insert_analysis(
                &conn,
                &sample_record(&format!("m{i}"), &format!("https://x/{i}.jpg"), "HUMOR"),
            )
            .unwrap();
        }

        let (first, total) = list_analyses(&conn, None, 1, 9).unwrap();
        assert_eq!(total, 12);
        assert_eq!(first.len(), 9);

        let (second, _) = list_analyses(&conn, None, 2, 9).unwrap();
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let conn = open_memory_database().unwrap();
        insert_analysis(&conn, &sample_record("m1", "https://x/a.jpg", "HUMOR")).unwrap();
        assert!(delete_analysis(&conn, "m1").unwrap());
        assert!(!delete_analysis(&conn, "m1").unwrap());
    }

    #[test]
    fn existing_image_urls_returns_all() {
        let conn = open_memory_database().unwrap();
        insert_analysis(&conn, &sample_record("m1", "https://x/a.jpg", "HUMOR")).unwrap();
        insert_analysis(&conn, &sample_record("m2", "https://x/b.jpg", "HUMOR")).unwrap();
        let urls = existing_image_urls(&conn).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"https://x/a.jpg".to_string()));
    }
}
