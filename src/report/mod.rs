//! Report rendering.
//!
//! Both renderers are pure functions of the sorted snapshot and the instant
//! `now`; nothing here reads the clock.

mod html;
mod markdown;

use chrono::{DateTime, Utc};

use crate::model::RepositoryRecord;

pub use html::render_html;
pub use markdown::render_markdown;

/// Shown wherever a value is unknown.
pub const SENTINEL: &str = "-";

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// A year is a flat 365 days; leap days are ignored.
const MILLIS_PER_YEAR: i64 = 365 * MILLIS_PER_DAY;

/// Whole years between `created_at` and `now`, rounded down.
pub fn age_in_years(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_YEAR)
}

/// Whole days between `last_commit` and `now`, rounded down; `None` when
/// there is no commit.
pub fn days_since(last_commit: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    last_commit.map(|date| (now - date).num_milliseconds().div_euclid(MILLIS_PER_DAY))
}

/// Display-ready cells of one report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReportRow {
    pub full_name: String,
    pub hosting_url: String,
    pub stars: String,
    pub issues: String,
    pub age_in_years: String,
    pub days_since_last_commit: String,
    pub dependency_tags: String,
    pub license: Option<String>,
}

impl ReportRow {
    pub(crate) fn new(record: &RepositoryRecord, now: DateTime<Utc>) -> Self {
        Self {
            full_name: record.full_name.clone(),
            hosting_url: record.hosting_url.clone(),
            stars: or_sentinel(record.star_count),
            issues: or_sentinel(record.open_issues_count),
            age_in_years: age_in_years(record.created_at, now).to_string(),
            days_since_last_commit: or_sentinel(days_since(record.last_commit_date, now)),
            dependency_tags: record.dependency_tags.clone(),
            license: record.license_id.clone(),
        }
    }
}

fn or_sentinel(value: Option<i64>) -> String {
    value.map_or_else(|| SENTINEL.to_string(), |v| v.to_string())
}
