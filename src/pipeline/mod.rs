//! End-to-end run: fetch every catalog entry, store the results, then
//! render both reports from the stored snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use futures_util::{StreamExt, stream};
use log::{error, info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::http::build_http_client;
use crate::report::{render_html, render_markdown};
use crate::runtime::Runtime;
use crate::source::{GitHubSource, MetadataSource};
use crate::store::MetadataStore;

/// Wire up the real collaborators from `config` and perform one full run.
///
/// Fails only when the run cannot start (bad catalog, unusable store) or the
/// reports cannot be written; individual entries that fail are reported in
/// the returned summary.
pub async fn run<R: Runtime>(runtime: &R, config: &Config) -> Result<RunSummary> {
    let catalog = match &config.catalog {
        Some(path) => Catalog::from_json_file(runtime, path)?,
        None => Catalog::builtin(),
    };
    info!("Tracking {} catalog entries", catalog.len());

    let http_client = build_http_client(&config.token, config.timeout)?;
    let source = GitHubSource::from_http_client(http_client, &config.api_url);

    let store = MetadataStore::open(&config.database)
        .await
        .with_context(|| format!("Failed to open store {}", config.database.display()))?;

    let paths = ReportPaths {
        html: config.html_output.clone(),
        markdown: config.markdown_output.clone(),
    };

    let summary = Pipeline::new(runtime, &source, &store)
        .with_concurrency(config.concurrency)
        .run(&catalog, &paths)
        .await;
    store.close().await;

    let summary = summary?;
    for url in &summary.fetch_failures {
        warn!("Not refreshed (fetch failed): {}", url);
    }
    for url in &summary.store_failures {
        warn!("Not refreshed (store failed): {}", url);
    }
    Ok(summary)
}

/// Where the two reports are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub html: PathBuf,
    pub markdown: PathBuf,
}

/// Outcome of the fetch and store phase, by canonical URL.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stored: Vec<String>,
    pub fetch_failures: Vec<String>,
    pub store_failures: Vec<String>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.fetch_failures.len() + self.store_failures.len()
    }
}

pub struct Pipeline<'a, R: Runtime, S: MetadataSource> {
    runtime: &'a R,
    source: &'a S,
    store: &'a MetadataStore,
    concurrency: usize,
}

impl<'a, R: Runtime, S: MetadataSource> Pipeline<'a, R, S> {
    pub fn new(runtime: &'a R, source: &'a S, store: &'a MetadataStore) -> Self {
        Self {
            runtime,
            source,
            store,
            concurrency: 1,
        }
    }

    /// Fetch up to `concurrency` entries at a time. Results are still stored
    /// in catalog order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Refresh the store from `catalog`, then write both reports.
    pub async fn run(&self, catalog: &Catalog, paths: &ReportPaths) -> Result<RunSummary> {
        let summary = self.refresh(catalog).await;
        info!(
            "Refreshed {} of {} entries ({} fetch failures, {} store failures)",
            summary.stored.len(),
            catalog.len(),
            summary.fetch_failures.len(),
            summary.store_failures.len()
        );

        self.publish(paths).await?;
        Ok(summary)
    }

    /// Fetch every entry and upsert what was fetched. A failed entry is
    /// logged and skipped; its stored row, if any, is left as it was.
    #[tracing::instrument(skip_all, fields(entries = catalog.len()))]
    pub async fn refresh(&self, catalog: &Catalog) -> RunSummary {
        let mut summary = RunSummary::default();

        let mut fetches = stream::iter(catalog.entries())
            .map(|entry| async move {
                info!("Fetching {}...", entry.source_url);
                (entry, self.source.fetch(&entry.source_url).await)
            })
            .buffered(self.concurrency);

        while let Some((entry, result)) = fetches.next().await {
            let remote = match result {
                Ok(remote) => remote,
                Err(e) => {
                    warn!("Skipping {}: {:#}", entry.canonical_url, e);
                    summary.fetch_failures.push(entry.canonical_url.clone());
                    continue;
                }
            };

            let record = remote.into_record(entry);
            match self.store.upsert(&record).await {
                Ok(()) => summary.stored.push(entry.canonical_url.clone()),
                Err(e) => {
                    error!("Failed to store {}: {}", entry.canonical_url, e);
                    summary.store_failures.push(entry.canonical_url.clone());
                }
            }
        }

        summary
    }

    /// Render the current snapshot and overwrite both report files.
    #[tracing::instrument(skip(self))]
    pub async fn publish(&self, paths: &ReportPaths) -> Result<()> {
        let records = self
            .store
            .fetch_all_sorted()
            .await
            .context("Failed to read the stored snapshot")?;
        let now = self.runtime.now();

        let html = render_html(&records, now)?;
        let markdown = render_markdown(&records, now);

        self.runtime.write(&paths.html, html.as_bytes())?;
        info!("Wrote {} ({} rows)", paths.html.display(), records.len());
        self.runtime.write(&paths.markdown, markdown.as_bytes())?;
        info!("Wrote {} ({} rows)", paths.markdown.display(), records.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::model::fixtures::{record, remote};
    use crate::runtime::MockRuntime;
    use crate::source::MockMetadataSource;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::{TempDir, tempdir};

    type Written = Arc<Mutex<HashMap<PathBuf, String>>>;

    async fn open_store() -> (TempDir, MetadataStore) {
        let dir = tempdir().unwrap();
        let store = MetadataStore::open(&dir.path().join("repos.db"))
            .await
            .unwrap();
        (dir, store)
    }

    fn paths() -> ReportPaths {
        ReportPaths {
            html: PathBuf::from("index.html"),
            markdown: PathBuf::from("README.md"),
        }
    }

    fn recording_runtime() -> (MockRuntime, Written) {
        let written: Written = Arc::default();
        let mut runtime = MockRuntime::new();
        runtime
            .expect_now()
            .returning(|| Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        let sink = written.clone();
        runtime.expect_write().returning(move |path, contents| {
            sink.lock().unwrap().insert(
                path.to_path_buf(),
                String::from_utf8(contents.to_vec()).unwrap(),
            );
            Ok(())
        });
        (runtime, written)
    }

    fn entry(name: &str) -> CatalogEntry {
        CatalogEntry::new(
            &format!("https://{}.org", name),
            &format!("https://github.com/acme/{}", name),
            "C",
        )
    }

    /// A source that serves `acme/<name>` for every source URL except `failing`.
    fn source_failing_on(failing: &'static str) -> MockMetadataSource {
        let mut source = MockMetadataSource::new();
        source.expect_fetch().returning(move |url| {
            let name = url.rsplit('/').next().unwrap().to_string();
            if name == failing {
                Err(anyhow::anyhow!("connection reset"))
            } else {
                let mut fetched = remote(&name);
                fetched.star_count = Some(name.len() as i64);
                Ok(fetched)
            }
        });
        source
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let (_dir, store) = open_store().await;
        let (runtime, written) = recording_runtime();
        let source = source_failing_on("none");
        let catalog = Catalog::new(vec![CatalogEntry::new(
            "https://example.org",
            "https://github.com/acme/widget",
            "C",
        )]);

        let summary = Pipeline::new(&runtime, &source, &store)
            .run(&catalog, &paths())
            .await
            .unwrap();

        assert_eq!(summary.stored, vec!["https://example.org"]);
        assert_eq!(summary.failed(), 0);

        let written = written.lock().unwrap();
        let markdown = &written[Path::new("README.md")];
        assert!(markdown.contains("[acme/widget](https://github.com/acme/widget)"));
        assert!(markdown.contains("https://img.shields.io/github/stars/acme/widget?style=social"));
        assert!(markdown.contains("| 4 | 1261 | C | MIT |"));

        let html = &written[Path::new("index.html")];
        assert!(html.contains("acme/widget"));
        assert!(html.contains("Last Updated At: 2024-06-15 12:00:00 UTC"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let (_dir, store) = open_store().await;

        let mut previous = record("https://bravo.org", "bravo");
        previous.star_count = Some(1234);
        store.upsert(&previous).await.unwrap();

        let (runtime, written) = recording_runtime();
        let source = source_failing_on("bravo");
        let catalog = Catalog::new(vec![entry("alpha"), entry("bravo"), entry("charlie")]);

        let summary = Pipeline::new(&runtime, &source, &store)
            .run(&catalog, &paths())
            .await
            .unwrap();

        assert_eq!(summary.stored, vec!["https://alpha.org", "https://charlie.org"]);
        assert_eq!(summary.fetch_failures, vec!["https://bravo.org"]);
        assert!(summary.store_failures.is_empty());

        let stored = store.fetch_all_sorted().await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0], previous);

        let written = written.lock().unwrap();
        let markdown = &written[Path::new("README.md")];
        assert!(markdown.contains("acme/alpha"));
        assert!(markdown.contains("acme/bravo"));
        assert!(markdown.contains("acme/charlie"));
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_the_run() {
        let (_dir, store) = open_store().await;
        sqlx::query(
            "CREATE TRIGGER reject_bravo BEFORE INSERT ON repositories \
             WHEN NEW.canonical_url = 'https://bravo.org' \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let (runtime, _written) = recording_runtime();
        let source = source_failing_on("none");
        let catalog = Catalog::new(vec![entry("alpha"), entry("bravo"), entry("charlie")]);

        let summary = Pipeline::new(&runtime, &source, &store)
            .refresh(&catalog)
            .await;

        assert_eq!(summary.stored, vec!["https://alpha.org", "https://charlie.org"]);
        assert_eq!(summary.store_failures, vec!["https://bravo.org"]);
        assert_eq!(summary.failed(), 1);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_stores_in_catalog_order() {
        let (_dir, store) = open_store().await;
        let (runtime, _written) = recording_runtime();
        let source = source_failing_on("none");
        let catalog = Catalog::new(vec![
            entry("alpha"),
            entry("bravo"),
            entry("charlie"),
            entry("delta"),
        ]);

        let summary = Pipeline::new(&runtime, &source, &store)
            .with_concurrency(3)
            .refresh(&catalog)
            .await;

        assert_eq!(
            summary.stored,
            vec![
                "https://alpha.org",
                "https://bravo.org",
                "https://charlie.org",
                "https://delta.org"
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_entries_keep_the_later_tags() {
        let (_dir, store) = open_store().await;
        let (runtime, _written) = recording_runtime();
        let source = source_failing_on("none");
        let catalog = Catalog::new(vec![
            CatalogEntry::new(
                "https://cordova.apache.org",
                "https://github.com/apache/cordova",
                "JavaScript",
            ),
            CatalogEntry::new(
                "https://cordova.apache.org",
                "https://github.com/apache/cordova",
                "HTML, CSS, JavaScript",
            ),
        ]);

        Pipeline::new(&runtime, &source, &store)
            .refresh(&catalog)
            .await;

        let stored = store.fetch_all_sorted().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].dependency_tags, "HTML, CSS, JavaScript");
    }

    #[tokio::test]
    async fn test_publish_orders_rows_by_stars() {
        let (_dir, store) = open_store().await;
        let mut low = record("https://low.org", "low");
        low.star_count = Some(1);
        let mut high = record("https://high.org", "high");
        high.star_count = Some(100);
        store.upsert(&low).await.unwrap();
        store.upsert(&high).await.unwrap();

        let (runtime, written) = recording_runtime();
        let source = MockMetadataSource::new();
        Pipeline::new(&runtime, &source, &store)
            .publish(&paths())
            .await
            .unwrap();

        let written = written.lock().unwrap();
        let html = &written[Path::new("index.html")];
        assert!(html.find("acme/high").unwrap() < html.find("acme/low").unwrap());
    }

    #[tokio::test]
    async fn test_publish_write_failure_is_reported() {
        let (_dir, store) = open_store().await;
        let mut runtime = MockRuntime::new();
        runtime
            .expect_now()
            .returning(|| Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        runtime
            .expect_write()
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));
        let source = MockMetadataSource::new();

        let result = Pipeline::new(&runtime, &source, &store)
            .publish(&paths())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_reads_catalog_through_runtime() {
        let dir = tempdir().unwrap();
        let database = dir.path().join("repos.db");
        let config = Config {
            token: "token".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            database: database.clone(),
            html_output: dir.path().join("index.html"),
            markdown_output: dir.path().join("README.md"),
            catalog: Some(PathBuf::from("catalog.json")),
            timeout: std::time::Duration::from_secs(1),
            concurrency: 1,
        };
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .withf(|path| path == Path::new("catalog.json"))
            .times(1)
            .returning(|_| Ok("not json".to_string()));
        runtime.expect_write().never();

        let err = run(&runtime, &config).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid catalog file catalog.json"));
        assert!(!database.exists());
    }
}
