//! Approximate duplicate detection for imported images.
//!
//! Three-way membership test against existing rows: exact URL, final path
//! segment (with extension), and filename stem. Any hit counts as a
//! duplicate. Accepts false negatives (same image re-hosted under a new
//! name); the checks are specific enough that false positives are rare.

use std::collections::HashSet;

use crate::models::MemeRecord;

#[derive(Debug, Default)]
pub struct DuplicateIndex {
    urls: HashSet<String>,
    filenames: HashSet<String>,
    stems: HashSet<String>,
}

impl DuplicateIndex {
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for url in urls {
            index.insert(url.as_ref());
        }
        index
    }

    pub fn insert(&mut self, url: &str) {
        if let Some(filename) = final_segment(url) {
            if let Some(stem) = stem(&filename) {
                self.stems.insert(stem);
            }
            self.filenames.insert(filename);
        }
        self.urls.insert(url.to_string());
    }

    /// True when the URL matches an existing row by any of the three keys.
    pub fn is_duplicate(&self, url: &str) -> bool {
        if self.urls.contains(url) {
            return true;
        }
        if let Some(filename) = final_segment(url) {
            if self.filenames.contains(&filename) {
                return true;
            }
            if let Some(stem) = stem(&filename) {
                if self.stems.contains(&stem) {
                    return true;
                }
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Last path segment, query string stripped, lowercased.
fn final_segment(url: &str) -> Option<String> {
    let without_query = url.split('?').next().unwrap_or(url);
    let segment = without_query.rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }
    Some(segment.to_ascii_lowercase())
}

/// Filename without its extension.
fn stem(filename: &str) -> Option<String> {
    let stem = filename.split('.').next()?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

/// Group a loaded page of records by exact image URL; only groups with more
/// than one member are returned. No perceptual or near-duplicate matching.
pub fn group_exact_duplicates(records: &[MemeRecord]) -> Vec<Vec<MemeRecord>> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: std::collections::HashMap<&str, Vec<&MemeRecord>> =
        std::collections::HashMap::new();

    for record in records {
        let entry = groups.entry(record.image_url.as_str()).or_default();
        if entry.is_empty() {
            order.push(record.image_url.as_str());
        }
        entry.push(record);
    }

    order
        .into_iter()
        .filter_map(|url| {
            let group = &groups[url];
            (group.len() > 1).then(|| group.iter().map(|r| (*r).clone()).collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn exact_url_match_is_duplicate() {
        let index = DuplicateIndex::from_urls(["https://i.redd.it/abc123.jpg"]);
        assert!(index.is_duplicate("https://i.redd.it/abc123.jpg"));
    }

    #[test]
    fn same_filename_different_host_is_duplicate() {
        let index = DuplicateIndex::from_urls(["https://i.redd.it/abc123.jpg"]);
        assert!(index.is_duplicate("https://i.imgur.com/abc123.jpg"));
    }

    #[test]
    fn same_stem_different_extension_is_duplicate() {
        let index = DuplicateIndex::from_urls(["https://i.redd.it/abc123.jpg"]);
        assert!(index.is_duplicate("https://cdn.example.com/memes/abc123.png"));
    }

    #[test]
    fn different_filename_is_kept() {
        let index = DuplicateIndex::from_urls(["https://i.redd.it/abc123.jpg"]);
        assert!(!index.is_duplicate("https://i.redd.it/xyz789.jpg"));
    }

    #[test]
    fn filename_match_is_case_insensitive() {
        let index = DuplicateIndex::from_urls(["https://i.redd.it/ABC123.jpg"]);
        assert!(index.is_duplicate("https://i.imgur.com/abc123.JPG"));
    }

    #[test]
    fn query_strings_are_ignored_for_filenames() {
        let index = DuplicateIndex::from_urls(["https://preview.redd.it/abc123.jpg?width=640"]);
        assert!(index.is_duplicate("https://i.redd.it/abc123.jpg"));
    }

    #[test]
    fn insert_extends_the_index() {
        let mut index = DuplicateIndex::default();
        assert!(index.is_empty());
        index.insert("https://i.redd.it/abc123.jpg");
        assert_eq!(index.len(), 1);
        assert!(index.is_duplicate("https://i.redd.it/abc123.jpg"));
    }

    fn record(id: &str, url: &str) -> MemeRecord {
        MemeRecord {
            id: id.to_string(),
            image_url: url.to_string(),
            title: None,
            source_url: None,
            verdict: "HUMOR".to_string(),
            confidence: 50,
            overall_explanation: None,
            claims: vec![],
            sources: vec![],
            feedback_incorporated: false,
            analyzed_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn groups_only_urls_with_multiple_rows() {
        let records = vec![
            record("m1", "https://x/a.jpg"),
            record("m2", "https://x/b.jpg"),
            record("m3", "https://x/a.jpg"),
            record("m4", "https://x/c.jpg"),
            record("m5", "https://x/a.jpg"),
        ];

        let groups = group_exact_duplicates(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert!(groups[0].iter().all(|r| r.image_url == "https://x/a.jpg"));
    }

    #[test]
    fn near_identical_urls_are_not_grouped() {
        // Exact-match grouping only: a query-string variant is a different key
        let records = vec![
            record("m1", "https://x/a.jpg"),
            record("m2", "https://x/a.jpg?width=640"),
        ];
        assert!(group_exact_duplicates(&records).is_empty());
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert!(group_exact_duplicates(&[]).is_empty());
    }
}
