//! Sources of repository metadata.
//!
//! A [`MetadataSource`] turns the web URL of a hosted repository into a
//! [`RemoteRepository`]. The only implementation talks to the GitHub REST API.

mod github;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::model::RemoteRepository;

pub use github::{DEFAULT_API_URL, GITHUB_WEB_PREFIX, GitHubSource};

/// Repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    /// Parse the owner and name out of a `https://github.com/<owner>/<repo>` URL.
    pub fn from_source_url(source_url: &str) -> Result<Self> {
        let path = source_url.strip_prefix(GITHUB_WEB_PREFIX).ok_or_else(|| {
            anyhow::anyhow!(
                "'{}' is not a repository URL under {}",
                source_url,
                GITHUB_WEB_PREFIX
            )
        })?;
        path.trim_end_matches('/').parse()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            anyhow::bail!("Invalid repository format. Expected 'owner/repo'.")
        } else {
            Ok(RepoId {
                owner: parts[0].to_string(),
                repo: parts[1].to_string(),
            })
        }
    }
}

/// Fetches the metadata snapshot of one hosted repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Retrieve metadata and the newest commit timestamp for `source_url`.
    async fn fetch(&self, source_url: &str) -> Result<RemoteRepository>;
}
