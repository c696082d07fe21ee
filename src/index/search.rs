//! Lexical search over the snapshot.

use super::{SnapshotIndex, is_overdue};
use crate::types::{SearchOptions, TaskRecord};
use std::sync::{Arc, LazyLock};

/// Weight of a query token found in the title.
const TITLE_WEIGHT: f64 = 3.0;
/// Weight of a query token found in the notes.
const NOTES_WEIGHT: f64 = 1.0;
/// Bonus that surfaces overdue matches. Never applied to a zero score.
const OVERDUE_BONUS: f64 = 0.5;

static TOKEN_SEPARATOR: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"[^a-z0-9]+").expect("static token pattern compiles")
});

/// Lower-case `text` and split it on runs of non-alphanumeric characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_SEPARATOR
        .split(&lowered)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

impl SnapshotIndex {
    /// Search the snapshot for `query`, returning at most `options.k` records.
    ///
    /// Each query token found in a record's title scores 3, in its notes 1,
    /// and overdue matches get +0.5. Records scoring zero are dropped; ties
    /// keep snapshot order. A query with no tokens, or one that matches
    /// nothing, returns the browsing order instead: scheduled records by
    /// date, then the backlog.
    pub fn search_by_query(&self, query: &str, options: SearchOptions) -> Vec<Arc<TaskRecord>> {
        let snapshot = self.snapshot();
        let records = &snapshot.records;
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return browse_order(records, options.k);
        }

        let today = self.today_ymd_for(&snapshot);
        let mut scored: Vec<(f64, &Arc<TaskRecord>)> = records
            .iter()
            .map(|record| (score(record, &query_tokens, &today), record))
            .collect();

        // sort_by is stable, so equal scores keep snapshot order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let top: Vec<Arc<TaskRecord>> = scored
            .into_iter()
            .filter(|(s, _)| *s > 0.0)
            .take(options.k)
            .map(|(_, record)| Arc::clone(record))
            .collect();

        if top.is_empty() {
            return browse_order(records, options.k);
        }
        top
    }
}

fn score(record: &TaskRecord, query_tokens: &[String], today_ymd: &str) -> f64 {
    let title_tokens = tokenize(&record.title);
    let notes_tokens = tokenize(&record.notes);

    let mut score = 0.0;
    for token in query_tokens {
        if title_tokens.contains(token) {
            score += TITLE_WEIGHT;
        }
        if notes_tokens.contains(token) {
            score += NOTES_WEIGHT;
        }
    }
    // only lifts records that already match
    if score > 0.0 && is_overdue(record, today_ymd) {
        score += OVERDUE_BONUS;
    }
    score
}

/// Scheduled records ascending by date string, then the backlog, capped to `k`.
fn browse_order(records: &[Arc<TaskRecord>], k: usize) -> Vec<Arc<TaskRecord>> {
    let mut scheduled: Vec<&Arc<TaskRecord>> =
        records.iter().filter(|r| r.scheduled_for.is_some()).collect();
    scheduled.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for));

    scheduled
        .into_iter()
        .chain(records.iter().filter(|r| r.is_backlog()))
        .take(k)
        .map(Arc::clone)
        .collect()
}
