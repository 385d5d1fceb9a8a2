//! Which failed metadata requests are worth repeating.
//!
//! A catalog entry gets [`MAX_RETRIES`] attempts per request. Timeouts, dropped
//! connections and 5xx answers are repeated; a 4xx answer means the entry is
//! skipped for this run and reported with one of the [`NonRetryableError`]
//! messages below.

use reqwest::StatusCode;

/// Attempts per metadata request, the first one included.
pub const MAX_RETRIES: usize = 3;

/// Pause between two attempts, in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// A 4xx answer from the metadata API. Each variant carries the endpoint that
/// produced it.
#[derive(Debug)]
pub enum NonRetryableError {
    /// 429, or 403 mentioning the rate limit
    RateLimitExceeded(String),
    /// 401
    AuthenticationFailed(String),
    /// 404; the catalog's source URL names a repository that is gone or private
    NotFound(String),
    /// 403 for any other reason
    Forbidden(String),
    /// 409; the commits listing answers this for a repository without commits
    Conflict(String),
    /// Any other 4xx
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimitExceeded(endpoint) => {
                write!(f, "Rate limit reached while fetching {}", endpoint)
            }
            NonRetryableError::AuthenticationFailed(endpoint) => write!(
                f,
                "Authentication rejected for {}; GITHUB_TOKEN is invalid or expired",
                endpoint
            ),
            NonRetryableError::NotFound(endpoint) => {
                write!(f, "Not found: {}", endpoint)
            }
            NonRetryableError::Forbidden(endpoint) => {
                write!(f, "Access forbidden: {}", endpoint)
            }
            NonRetryableError::Conflict(endpoint) => {
                write!(f, "Conflict: {} has no data to list", endpoint)
            }
            NonRetryableError::ClientError(detail) => {
                write!(f, "Request error: {}", detail)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// `Ok(())` when `error` may succeed on another attempt, otherwise the
/// [`NonRetryableError`] describing why the entry is skipped.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // no response at all: timeout, refused or reset connection
        return Ok(());
    };
    let endpoint = error
        .url()
        .map(|url| url.to_string())
        .unwrap_or_else(|| "<unknown endpoint>".to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(endpoint)),
        StatusCode::FORBIDDEN if error.to_string().contains("rate limit") => {
            Err(NonRetryableError::RateLimitExceeded(endpoint))
        }
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(endpoint)),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(endpoint)),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(endpoint)),
        StatusCode::CONFLICT => Err(NonRetryableError::Conflict(endpoint)),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} from {}",
            s.as_u16(),
            endpoint
        ))),
        _ => Ok(()),
    }
}

/// Wrap an `error_for_status()` failure so the retry loop can tell the two
/// kinds apart by downcasting.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
