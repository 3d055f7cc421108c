//! Command-line interface for gitlab-contributors: argument parsing, config
//! merging and the async [`run`] entrypoint used by `main()` and integration tests.
//!
//! All counting logic lives in [`crate::aggregate`]; this module wires the real
//! GitLab client and CSV emitter to it and prints the summary.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::aggregate::{aggregate, Aggregation};
use crate::config::RunConfig;
use crate::contract::{PagedFetcher, ReportEmitter};
use crate::gitlab::GitlabClient;
use crate::load_config::{build_run_config, load_config, FileConfig, Overrides};
use crate::report::CsvReportEmitter;

/// CLI for gitlab-contributors: count active contributors across GitLab projects.
#[derive(Parser)]
#[clap(
    name = "gitlab-contributors",
    version,
    about = "Count active GitLab contributors over a rolling window, with a per-author file-extension breakdown"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count contributors for a project, a set of groups, or every visible project
    Count(CountArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct CountArgs {
    /// Path to an optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// GitLab base URL (default https://gitlab.com/)
    #[clap(long)]
    pub url: Option<String>,
    /// Personal access token (falls back to GITLAB_TOKEN)
    #[clap(long)]
    pub token: Option<String>,
    /// Single project path with namespace, e.g. `org/repo`
    #[clap(long)]
    pub project: Option<String>,
    /// Group names or paths to search, comma separated
    #[clap(long, value_delimiter = ',')]
    pub groups: Vec<String>,
    /// Window start, `YYYY-MM-DD` or RFC 3339 (default three months ago)
    #[clap(long)]
    pub since: Option<String>,
    /// Directory for the CSV reports
    #[clap(long)]
    pub output_dir: Option<PathBuf>,
}

impl CountArgs {
    fn resolve(self) -> Result<RunConfig> {
        let file = match &self.config {
            Some(path) => load_config(path)?,
            None => FileConfig::default(),
        };
        let overrides = Overrides {
            url: self.url,
            token: self.token,
            project: self.project,
            groups: self.groups,
            since: self.since,
            output_dir: self.output_dir,
        };
        build_run_config(file, overrides, chrono::Utc::now())
    }
}

/// Aggregates `config.target` with `fetcher` and hands the result to `emitter`.
pub async fn count<F, E>(fetcher: &F, emitter: &E, config: &RunConfig) -> Result<Aggregation>
where
    F: PagedFetcher + ?Sized,
    E: ReportEmitter + ?Sized,
{
    let aggregation = aggregate(fetcher, &config.target, config.since).await;
    emitter
        .emit(&aggregation.contributors, &aggregation.extensions)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to write report: {e}"))?;
    Ok(aggregation)
}

fn print_summary(config: &RunConfig, aggregation: &Aggregation) {
    println!(
        "Scanned {} project(s) for commits since {}.",
        aggregation.projects_scanned,
        config.since.format("%Y-%m-%d")
    );
    println!("Unique contributors: {}", aggregation.contributors.len());
    for (name, contributor) in &aggregation.contributors {
        println!(
            "  {} <{}>: {} commit(s) in {}",
            name,
            contributor.email,
            contributor.contributions_count,
            contributor.repos_contributed_to.join(", ")
        );
    }
    if aggregation.is_partial() {
        println!(
            "Some data could not be retrieved from GitLab ({} failure(s)). Try running with `RUST_LOG=debug gitlab-contributors`",
            aggregation.degraded.len()
        );
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Count(args) => {
            let config = args.resolve()?;
            config.trace_loaded();
            tracing::info!(command = "count", "Starting contributor count");

            let client = GitlabClient::new();
            let emitter = CsvReportEmitter::new(config.output_dir.clone());
            match count(&client, &emitter, &config).await {
                Ok(aggregation) => {
                    tracing::info!(
                        command = "count",
                        contributors = aggregation.contributors.len(),
                        "Contributor count complete"
                    );
                    print_summary(&config, &aggregation);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "count", error = %e, "Contributor count failed");
                    Err(e)
                }
            }
        }
    }
}
