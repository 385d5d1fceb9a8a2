//! Run configuration assembled at startup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::runtime::Runtime;

/// Environment variable holding the API bearer token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub database: PathBuf,
    pub html_output: PathBuf,
    pub markdown_output: PathBuf,
    /// JSON catalog replacing the built-in one.
    pub catalog: Option<PathBuf>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum number of catalog entries fetched at the same time.
    pub concurrency: usize,
}

/// Read the bearer token once. A missing or blank token is fatal.
pub fn token_from_env<R: Runtime>(runtime: &R) -> Result<String> {
    match runtime.env_var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Ok(_) => bail!("{} is set but empty", TOKEN_ENV),
        Err(_) => bail!("{} is not set", TOKEN_ENV),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn runtime_with_token(token: Option<&'static str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(TOKEN_ENV))
            .returning(move |_| {
                token
                    .map(str::to_string)
                    .ok_or(std::env::VarError::NotPresent)
            });
        runtime
    }

    #[test]
    fn test_token_from_env() {
        let runtime = runtime_with_token(Some("ghp_secret\n"));
        assert_eq!(token_from_env(&runtime).unwrap(), "ghp_secret");
    }

    #[test]
    fn test_token_from_env_missing() {
        let runtime = runtime_with_token(None);
        let err = token_from_env(&runtime).unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN is not set"));
    }

    #[test]
    fn test_token_from_env_blank() {
        let runtime = runtime_with_token(Some("   "));
        assert!(token_from_env(&runtime).is_err());
    }
}
