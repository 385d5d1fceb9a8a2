use anyhow::Result;
use clap::Parser;
use log::info;
use repotable::config::{Config, token_from_env};
use repotable::runtime::RealRuntime;
use repotable::source::DEFAULT_API_URL;
use std::path::PathBuf;
use std::time::Duration;

/// repotable - tracked repository report generator
///
/// Fetches metadata for every tracked repository from the GitHub API, stores
/// the latest snapshot in a local SQLite database and writes an HTML and a
/// Markdown table ranked by stars.
///
/// The GITHUB_TOKEN environment variable must hold an API token.
#[derive(Parser, Debug)]
#[command(author, version = env!("REPOTABLE_VERSION"), about)]
struct Cli {
    /// GitHub API URL
    #[arg(long = "api-url", value_name = "URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// SQLite database file (also via REPOTABLE_DB)
    #[arg(
        long = "database",
        env = "REPOTABLE_DB",
        value_name = "PATH",
        default_value = "github_repos.db"
    )]
    database: PathBuf,

    /// Where to write the HTML report
    #[arg(long = "html-output", value_name = "PATH", default_value = "index.html")]
    html_output: PathBuf,

    /// Where to write the Markdown report
    #[arg(long = "markdown-output", value_name = "PATH", default_value = "README.md")]
    markdown_output: PathBuf,

    /// JSON catalog to track instead of the built-in list
    #[arg(long = "catalog", value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout-secs", value_name = "SECONDS", default_value_t = 10)]
    timeout_secs: u64,

    /// Number of repositories fetched at the same time
    #[arg(
        long = "concurrency",
        value_name = "N",
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..=32)
    )]
    concurrency: u16,
}

impl Cli {
    fn into_config(self, token: String) -> Config {
        Config {
            token,
            api_url: self.api_url,
            database: self.database,
            html_output: self.html_output,
            markdown_output: self.markdown_output,
            catalog: self.catalog,
            timeout: Duration::from_secs(self.timeout_secs),
            concurrency: usize::from(self.concurrency),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let token = token_from_env(&runtime)?;
    let config = cli.into_config(token);

    let summary = repotable::pipeline::run(&runtime, &config).await?;
    info!(
        "Done: {} refreshed, {} failed",
        summary.stored.len(),
        summary.failed()
    );
    Ok(())
}
