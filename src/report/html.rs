//! HTML table report.

use anyhow::{Context, Result};
use askama::Template;
use chrono::{DateTime, Utc};

use crate::model::RepositoryRecord;

use super::ReportRow;

const UNKNOWN_LICENSE: &str = "Unknown";

struct HtmlRow {
    full_name: String,
    hosting_url: String,
    stars: String,
    issues: String,
    age_in_years: String,
    days_since_last_commit: String,
    dependency_tags: String,
    license: String,
}

impl From<ReportRow> for HtmlRow {
    fn from(row: ReportRow) -> Self {
        Self {
            full_name: row.full_name,
            hosting_url: row.hosting_url,
            stars: row.stars,
            issues: row.issues,
            age_in_years: row.age_in_years,
            days_since_last_commit: row.days_since_last_commit,
            dependency_tags: row.dependency_tags,
            license: row.license.unwrap_or_else(|| UNKNOWN_LICENSE.to_string()),
        }
    }
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    rows: Vec<HtmlRow>,
    generated_at: String,
}

/// Render `records` (already sorted) as an HTML table followed by a
/// "Last Updated At" footer stamped with `now`.
pub fn render_html(records: &[RepositoryRecord], now: DateTime<Utc>) -> Result<String> {
    let template = ReportTemplate {
        rows: records
            .iter()
            .map(|record| ReportRow::new(record, now).into())
            .collect(),
        generated_at: now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    };
    template.render().context("Failed to render HTML report")
}
