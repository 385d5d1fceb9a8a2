//! Domain model shared by the fetcher, the store and the report renderer.

use chrono::{DateTime, Utc};
use crate::catalog::CatalogEntry;

/// Repository metadata as retrieved from the hosting service, before it is
/// tied to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub name: String,
    /// `owner/repo`
    pub full_name: String,
    pub organization: String,
    pub homepage_url: Option<String>,
    pub hosting_url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub open_issues_count: Option<i64>,
    pub star_count: Option<i64>,
    pub watcher_count: Option<i64>,
    pub primary_language: Option<String>,
    /// SPDX identifier of the license, if the service detected one.
    pub license_id: Option<String>,
    /// Committer timestamp of the newest commit on the default branch.
    pub last_commit_date: Option<DateTime<Utc>>,
    pub fork_count: Option<i64>,
}

impl RemoteRepository {
    /// Stamp the fetched metadata with the identity and tags of its catalog entry.
    pub fn into_record(self, entry: &CatalogEntry) -> RepositoryRecord {
        RepositoryRecord {
            canonical_url: entry.canonical_url.clone(),
            dependency_tags: entry.dependency_tags.clone(),
            name: self.name,
            full_name: self.full_name,
            organization: self.organization,
            homepage_url: self.homepage_url,
            hosting_url: self.hosting_url,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            open_issues_count: self.open_issues_count,
            star_count: self.star_count,
            watcher_count: self.watcher_count,
            primary_language: self.primary_language,
            license_id: self.license_id,
            last_commit_date: self.last_commit_date,
            fork_count: self.fork_count,
        }
    }
}

/// The persisted snapshot of one tracked project, keyed by `canonical_url`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RepositoryRecord {
    pub canonical_url: String,
    pub dependency_tags: String,
    pub name: String,
    pub full_name: String,
    pub organization: String,
    pub homepage_url: Option<String>,
    pub hosting_url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub open_issues_count: Option<i64>,
    pub star_count: Option<i64>,
    pub watcher_count: Option<i64>,
    pub primary_language: Option<String>,
    pub license_id: Option<String>,
    pub last_commit_date: Option<DateTime<Utc>>,
    pub fork_count: Option<i64>,
}
