//! Markdown (README) report.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::model::RepositoryRecord;

use super::{ReportRow, SENTINEL};

const TITLE_BLOCK: &str = "# Awesome Datatables

![Contributions Welcome](https://img.shields.io/badge/Contributions-welcome-blue.svg)

";

const TABLE_HEADER: &str = "| Name | Stars | Issues | Age (Years) | Last Commit (days) | Dependencies | License |
|------|--------------|--------|-------|--------|-------------|-------------|
";

/// Render `records` (already sorted) as the README: a title block and one
/// table row per record. Star and issue cells are live badges, so they do
/// not depend on the stored counts.
pub fn render_markdown(records: &[RepositoryRecord], now: DateTime<Utc>) -> String {
    let mut markdown = String::from(TITLE_BLOCK);
    markdown.push_str(TABLE_HEADER);

    for record in records {
        let row = ReportRow::new(record, now);
        let full_name = &row.full_name;
        // Writing into a String cannot fail
        let _ = writeln!(
            markdown,
            "| [{name}](https://github.com/{full_name}) \
             | ![Stars](https://img.shields.io/github/stars/{full_name}?style=social) \
             | ![Issues](https://img.shields.io/github/issues/{full_name}) \
             | {age} | {days} | {tags} | {license} |",
            name = escape_cell(full_name),
            age = row.age_in_years,
            days = row.days_since_last_commit,
            tags = escape_cell(&row.dependency_tags),
            license = escape_cell(row.license.as_deref().unwrap_or(SENTINEL)),
        );
    }

    markdown
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::record;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_render_markdown_empty_has_title_and_header() {
        let markdown = render_markdown(&[], now());
        assert!(markdown.starts_with("# Awesome Datatables\n"));
        assert!(markdown.contains("Contributions-welcome-blue.svg"));
        assert!(markdown.ends_with("|-------------|\n"));
    }

    #[test]
    fn test_render_markdown_row() {
        let markdown = render_markdown(&[record("https://example.org", "widget")], now());
        let row = markdown.lines().last().unwrap();

        assert_eq!(
            row,
            "| [acme/widget](https://github.com/acme/widget) \
             | ![Stars](https://img.shields.io/github/stars/acme/widget?style=social) \
             | ![Issues](https://img.shields.io/github/issues/acme/widget) \
             | 4 | 1261 | C | MIT |"
        );
    }

    #[test]
    fn test_render_markdown_null_license_is_dash() {
        let mut r = record("https://example.org", "widget");
        r.license_id = None;
        let markdown = render_markdown(&[r], now());
        assert!(markdown.lines().last().unwrap().ends_with("| C | - |"));
    }

    #[test]
    fn test_render_markdown_null_last_commit_is_sentinel() {
        let mut r = record("https://example.org", "widget");
        r.last_commit_date = None;
        let markdown = render_markdown(&[r], now());
        assert!(markdown.contains("| 4 | - | C | MIT |"));
        assert!(!markdown.contains("NaN"));
    }

    #[test]
    fn test_render_markdown_escapes_pipes() {
        let mut r = record("https://example.org", "widget");
        r.dependency_tags = "C | C++".to_string();
        let markdown = render_markdown(&[r], now());
        assert!(markdown.contains("| C \\| C++ |"));
    }

    #[test]
    fn test_render_markdown_is_deterministic() {
        let records = vec![
            record("https://a.org", "alpha"),
            record("https://b.org", "bravo"),
        ];
        assert_eq!(
            render_markdown(&records, now()),
            render_markdown(&records, now())
        );
    }
}
