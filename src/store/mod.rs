//! Persistent store of repository snapshots.
//!
//! A single SQLite table keyed by the catalog entry's canonical URL. Writes
//! are single-statement upserts, so each row update is atomic on its own;
//! nothing spans more than one row.

use std::path::Path;

use log::{debug, info};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};

use crate::model::RepositoryRecord;

#[derive(Debug)]
pub enum StoreError {
    Schema(sqlx::Error),
    Query(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Schema(err) => write!(f, "Store schema error: {}", err),
            StoreError::Query(err) => write!(f, "Store query error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Schema(err) | StoreError::Query(err) => Some(err),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Query(err)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

const COLUMNS: &str = "canonical_url, dependency_tags, name, full_name, organization, \
     homepage_url, hosting_url, description, created_at, updated_at, open_issues_count, \
     star_count, watcher_count, primary_language, license_id, last_commit_date, fork_count";

/// Store handle; cheap to clone, all clones share one pool.
#[derive(Clone)]
pub struct MetadataStore {
    pool: SqlitePool,
}

impl MetadataStore {
    /// Open (creating if missing) the database file at `path` and make sure
    /// the schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let store = Self::with_options(options);
        store.ensure_schema().await?;

        info!("Store opened at {}", path.display());
        Ok(store)
    }

    fn with_options(options: SqliteConnectOptions) -> Self {
        Self {
            pool: SqlitePool::connect_lazy_with(options),
        }
    }

    /// Create the table if it does not exist yet. Safe to call on every start.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS repositories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                canonical_url TEXT NOT NULL UNIQUE,
                dependency_tags TEXT NOT NULL,
                name TEXT NOT NULL,
                full_name TEXT NOT NULL,
                organization TEXT NOT NULL,
                homepage_url TEXT,
                hosting_url TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                open_issues_count INTEGER,
                star_count INTEGER,
                watcher_count INTEGER,
                primary_language TEXT,
                license_id TEXT,
                last_commit_date TEXT,
                fork_count INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::Schema)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_repositories_hosting_url ON repositories(hosting_url)",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::Schema)?;

        Ok(())
    }

    /// Insert `record`, or overwrite every non-key column of the row that
    /// already has its canonical URL.
    #[tracing::instrument(skip(self, record), fields(canonical_url = %record.canonical_url))]
    pub async fn upsert(&self, record: &RepositoryRecord) -> Result<()> {
        let statement = format!(
            r#"
            INSERT INTO repositories ({COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(canonical_url) DO UPDATE SET
                dependency_tags = excluded.dependency_tags,
                name = excluded.name,
                full_name = excluded.full_name,
                organization = excluded.organization,
                homepage_url = excluded.homepage_url,
                hosting_url = excluded.hosting_url,
                description = excluded.description,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                open_issues_count = excluded.open_issues_count,
                star_count = excluded.star_count,
                watcher_count = excluded.watcher_count,
                primary_language = excluded.primary_language,
                license_id = excluded.license_id,
                last_commit_date = excluded.last_commit_date,
                fork_count = excluded.fork_count
            "#
        );

        sqlx::query(&statement)
            .bind(&record.canonical_url)
            .bind(&record.dependency_tags)
            .bind(&record.name)
            .bind(&record.full_name)
            .bind(&record.organization)
            .bind(&record.homepage_url)
            .bind(&record.hosting_url)
            .bind(&record.description)
            .bind(record.created_at)
            .bind(record.updated_at)
            .bind(record.open_issues_count)
            .bind(record.star_count)
            .bind(record.watcher_count)
            .bind(&record.primary_language)
            .bind(&record.license_id)
            .bind(record.last_commit_date)
            .bind(record.fork_count)
            .execute(&self.pool)
            .await?;

        debug!("Upserted {}", record.canonical_url);
        Ok(())
    }

    /// Every stored record, most popular first.
    ///
    /// Order: stars descending, open issues ascending, creation date
    /// descending, last commit descending, canonical URL ascending. SQLite
    /// sorts NULL as the smallest value, so absent values go last for the
    /// descending keys and first for open issues.
    pub async fn fetch_all_sorted(&self) -> Result<Vec<RepositoryRecord>> {
        let statement = format!(
            "SELECT {COLUMNS} FROM repositories \
             ORDER BY star_count DESC, open_issues_count ASC, created_at DESC, \
             last_commit_date DESC, canonical_url ASC"
        );
        let records = sqlx::query_as::<_, RepositoryRecord>(&statement)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Look up a record by its hosting service URL.
    pub async fn fetch_one(&self, hosting_url: &str) -> Result<Option<RepositoryRecord>> {
        let statement = format!("SELECT {COLUMNS} FROM repositories WHERE hosting_url = ?");
        let record = sqlx::query_as::<_, RepositoryRecord>(&statement)
            .bind(hosting_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Number of stored rows.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM repositories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
