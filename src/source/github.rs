//! GitHub source implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use crate::http::{HttpClient, NonRetryableError};
use crate::model::RemoteRepository;

use super::{MetadataSource, RepoId};

/// Web prefix that every tracked source URL starts with.
pub const GITHUB_WEB_PREFIX: &str = "https://github.com/";

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub API response types (internal).
mod api {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct RepoInfo {
        pub name: String,
        pub full_name: String,
        pub owner: Owner,
        pub homepage: Option<String>,
        pub html_url: String,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub open_issues_count: Option<u64>,
        pub stargazers_count: Option<u64>,
        pub watchers_count: Option<u64>,
        pub language: Option<String>,
        pub license: Option<License>,
        pub forks_count: Option<u64>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Owner {
        pub login: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct License {
        pub spdx_id: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct CommitItem {
        pub commit: Commit,
    }

    #[derive(Deserialize, Debug)]
    pub struct Commit {
        pub committer: Option<Signature>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Signature {
        pub date: DateTime<Utc>,
    }
}

/// GitHub source implementation.
pub struct GitHubSource {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubSource {
    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Metadata endpoint for `source_url`; the web prefix is swapped for the API prefix.
    pub fn repo_endpoint(&self, source_url: &str) -> Result<String> {
        let repo = RepoId::from_source_url(source_url)?;
        Ok(format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.repo))
    }

    async fn fetch_repo_info(&self, endpoint: &str) -> Result<api::RepoInfo> {
        debug!("Fetching repo info from {}...", endpoint);
        self.http_client.get_json(endpoint).await
    }

    /// Newest commit on the default branch, `None` when the branch has no commits.
    async fn fetch_last_commit_date(&self, endpoint: &str) -> Result<Option<DateTime<Utc>>> {
        let url = format!("{}/commits", endpoint);
        debug!("Fetching latest commit from {}...", url);

        let result: Result<Vec<api::CommitItem>> = self
            .http_client
            .get_json_with_query(&url, &[("per_page", "1")])
            .await;

        match result {
            Ok(commits) => Ok(commits
                .into_iter()
                .next()
                .and_then(|item| item.commit.committer)
                .map(|committer| committer.date)),
            // GitHub answers 409 for repositories without any commits
            Err(e) if matches!(
                e.downcast_ref::<NonRetryableError>(),
                Some(NonRetryableError::Conflict(_))
            ) =>
            {
                debug!("{} has no commits", endpoint);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl MetadataSource for GitHubSource {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, source_url: &str) -> Result<RemoteRepository> {
        let endpoint = self.repo_endpoint(source_url)?;

        let info = self
            .fetch_repo_info(&endpoint)
            .await
            .with_context(|| format!("Failed to fetch repository metadata for {}", source_url))?;

        let last_commit_date = self
            .fetch_last_commit_date(&endpoint)
            .await
            .with_context(|| format!("Failed to fetch latest commit for {}", source_url))?;

        let mut remote = RemoteRepository::try_from(info)?;
        remote.last_commit_date = last_commit_date;
        Ok(remote)
    }
}

fn count(field: &str, value: Option<u64>) -> Result<Option<i64>> {
    value
        .map(|n| i64::try_from(n).with_context(|| format!("{} out of range: {}", field, n)))
        .transpose()
}

impl TryFrom<api::RepoInfo> for RemoteRepository {
    type Error = anyhow::Error;

    fn try_from(info: api::RepoInfo) -> Result<Self> {
        Ok(RemoteRepository {
            name: info.name,
            full_name: info.full_name,
            organization: info.owner.login,
            homepage_url: info.homepage.filter(|h| !h.trim().is_empty()),
            hosting_url: info.html_url,
            description: info.description,
            created_at: info.created_at,
            updated_at: info.updated_at,
            open_issues_count: count("open_issues_count", info.open_issues_count)?,
            star_count: count("stargazers_count", info.stargazers_count)?,
            watcher_count: count("watchers_count", info.watchers_count)?,
            primary_language: info.language,
            license_id: info.license.and_then(|l| l.spdx_id),
            last_commit_date: None,
            fork_count: count("forks_count", info.forks_count)?,
        })
    }
}
