//! Quick-fill and manual fetch flows.
//!
//! Subreddits are fetched sequentially with a fixed delay between calls to
//! stay under Reddit's rate limits (a courtesy pause, not backoff). One
//! subreddit failing is recorded and skipped; the rest still run.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::duplicate::DuplicateIndex;
use super::reddit::{RedditClient, RedditPost};
use crate::db::repository::{existing_image_urls, insert_analysis};
use crate::db::{lock_db, DatabaseError};
use crate::models::{MemeRecord, PENDING_VERDICT};

/// Subreddits covered by the one-click quick fill.
pub const QUICK_FILL_SUBREDDITS: &[&str] = &[
    "PoliticalMemes",
    "PoliticalHumor",
    "TheRightCantMeme",
    "TheLeftCantMeme",
    "AdviceAnimals",
    "memes",
    "dankleft",
];

/// Fixed pause between subreddit fetches.
pub const SUBREDDIT_FETCH_DELAY: Duration = Duration::from_secs(1);

/// Posts requested per subreddit during quick fill.
pub const QUICK_FILL_PER_SUBREDDIT: u32 = 15;

/// Posts requested per subreddit for manual fetches.
pub const FETCH_PER_SUBREDDIT: u32 = 50;

/// Cap on candidates kept per import run.
pub const MAX_IMPORT_CANDIDATES: usize = 99;

/// Result of fetching candidates across subreddits.
#[derive(Debug, Serialize)]
pub struct FetchOutcome {
    pub candidates: Vec<CandidateMeme>,
    /// "name (reason)" entries for subreddits that failed.
    pub failed_sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateMeme {
    pub url: String,
    pub title: String,
    pub source: String,
    pub permalink: String,
    pub score: i64,
}

/// Summary returned by quick fill.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub saved: usize,
    pub skipped: usize,
    pub total_fetched: usize,
    pub errors: Vec<String>,
}

/// Drop duplicates, rank by score descending, cap the list.
pub fn select_candidates(
    posts: Vec<RedditPost>,
    index: &DuplicateIndex,
    max: usize,
) -> Vec<RedditPost> {
    let mut kept: Vec<RedditPost> = posts
        .into_iter()
        .filter(|post| !index.is_duplicate(&post.url))
        .collect();
    kept.sort_by(|a, b| b.score.cmp(&a.score));
    kept.truncate(max);
    kept
}

/// Fetch the hot listings of the given subreddits sequentially, pausing
/// between calls, then rank and cap the deduplicated result.
pub async fn fetch_candidates(
    reddit: &RedditClient,
    subreddits: &[String],
    per_subreddit: u32,
    index: &DuplicateIndex,
    max_total: usize,
) -> FetchOutcome {
    let mut all_posts = Vec::new();
    let mut failed_sources = Vec::new();

    for (i, subreddit) in subreddits.iter().enumerate() {
        match reddit.fetch_hot(subreddit, per_subreddit).await {
            Ok(posts) => all_posts.extend(posts),
            Err(e) => {
                tracing::warn!(subreddit, error = %e, "Subreddit fetch failed");
                failed_sources.push(format!("r/{subreddit} ({e})"));
            }
        }

        if i + 1 < subreddits.len() {
            tokio::time::sleep(SUBREDDIT_FETCH_DELAY).await;
        }
    }

    let candidates = select_candidates(all_posts, index, max_total)
        .into_iter()
        .map(|post| CandidateMeme {
            url: post.url,
            title: post.title,
            source: format!("r/{}", post.subreddit),
            permalink: post.permalink,
            score: post.score,
        })
        .collect();

    FetchOutcome {
        candidates,
        failed_sources,
    }
}

/// Persist fetched candidates as PENDING rows, skipping duplicates.
///
/// The index is advanced as rows are saved so one run cannot insert the
/// same image twice under different posts.
pub fn persist_candidates(
    conn: &Connection,
    candidates: Vec<CandidateMeme>,
    index: &mut DuplicateIndex,
) -> ImportSummary {
    let mut summary = ImportSummary {
        total_fetched: candidates.len(),
        ..Default::default()
    };

    for candidate in candidates {
        if index.is_duplicate(&candidate.url) {
            summary.skipped += 1;
            continue;
        }

        let record = MemeRecord {
            id: Uuid::new_v4().to_string(),
            image_url: candidate.url.clone(),
            title: Some(candidate.title),
            source_url: Some(candidate.permalink),
            verdict: PENDING_VERDICT.to_string(),
            confidence: 0,
            overall_explanation: Some(format!(
                "From {} - Score: {}",
                candidate.source, candidate.score
            )),
            claims: vec![],
            sources: vec![],
            feedback_incorporated: false,
            analyzed_at: Utc::now(),
            updated_at: None,
        };

        match insert_analysis(conn, &record) {
            Ok(()) => {
                index.insert(&candidate.url);
                summary.saved += 1;
            }
            Err(DatabaseError::ConstraintViolation(_)) => summary.skipped += 1,
            Err(e) => {
                tracing::warn!(url = %candidate.url, error = %e, "Failed to save candidate");
                summary.errors.push(format!("{}: {e}", candidate.url));
            }
        }
    }

    summary
}

/// One-click import: fetch the fixed subreddit list and persist every
/// non-duplicate candidate as a PENDING row awaiting analysis.
pub async fn quick_fill(
    conn: &Mutex<Connection>,
    reddit: &RedditClient,
) -> Result<ImportSummary, DatabaseError> {
    let mut index = {
        let db = lock_db(conn)?;
        DuplicateIndex::from_urls(existing_image_urls(&db)?)
    };

    let subreddits: Vec<String> = QUICK_FILL_SUBREDDITS
        .iter()
        .map(|s| s.to_string())
        .collect();
    let outcome = fetch_candidates(
        reddit,
        &subreddits,
        QUICK_FILL_PER_SUBREDDIT,
        &index,
        MAX_IMPORT_CANDIDATES,
    )
    .await;

    let failed_sources = outcome.failed_sources;
    let summary = {
        let db = lock_db(conn)?;
        let mut summary = persist_candidates(&db, outcome.candidates, &mut index);
        summary.errors.extend(failed_sources);
        summary
    };

    tracing::info!(
        saved = summary.saved,
        skipped = summary.skipped,
        "Quick fill complete"
    );
    Ok(summary)
}
