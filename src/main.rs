use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use tracker_harvester::config::Config;
use tracker_harvester::extract::CategoryTaxonomy;
use tracker_harvester::infra::github::GithubClient;
use tracker_harvester::infra::http_client::{ReqwestHttp, RetryPolicy, RetryingHttp};
use tracker_harvester::logging;
use tracker_harvester::pipeline::sync::sync_upstream;
use tracker_harvester::pipeline::Harvester;
use tracker_harvester::types::{IgnoreList, KnownTrackerSet};

#[derive(Parser)]
#[command(name = "tracker_harvester")]
#[command(about = "Harvests private tracker metadata from Jackett into a reviewable delta file")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./harvester.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract new private trackers from Jackett (default)
    Harvest {
        /// Curated dataset used to suppress known trackers
        #[arg(long)]
        known: Option<PathBuf>,
        /// Where to write the delta file (always overwritten)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Branch of the Jackett repository to read
        #[arg(long)]
        branch: Option<String>,
    },
    /// Refresh the curated dataset from the upstream spreadsheet
    Sync {
        /// Curated dataset to update in place
        #[arg(long)]
        file: Option<PathBuf>,
        /// Upstream dataset URL
        #[arg(long)]
        upstream: Option<String>,
    },
}

fn github_client(config: &Config) -> anyhow::Result<GithubClient> {
    let transport = ReqwestHttp::new(config.request_timeout()).context("building HTTP client")?;
    let http = RetryingHttp::new(Arc::new(transport), RetryPolicy::from(&config.retry));
    Ok(GithubClient::new(http, &config.github))
}

async fn run_harvest(mut config: Config, known: Option<PathBuf>, output: Option<PathBuf>, branch: Option<String>) -> anyhow::Result<()> {
    if let Some(path) = known {
        config.paths.known_dataset = path;
    }
    if let Some(path) = output {
        config.paths.output = path;
    }
    if let Some(branch) = branch {
        config.github.branch = branch;
    }

    let known = KnownTrackerSet::load(&config.paths.known_dataset).with_context(|| {
        format!(
            "loading known trackers from {}",
            config.paths.known_dataset.display()
        )
    })?;
    if known.is_empty() {
        warn!("curated dataset lists no trackers, every private tracker will be reported");
    } else {
        info!(known = known.len(), "loaded curated dataset");
    }

    let ignore = IgnoreList::with_extra(&config.filter.extra_ignore);
    let github = github_client(&config)?;
    let mut harvester = Harvester::new(github, config, known, ignore, CategoryTaxonomy::default());

    let summary = harvester.run().await?;

    println!("\nHarvest results (commit {}):", summary.commit);
    println!("   Definition files: {}", summary.definition_files);
    println!("   Indexer files: {}", summary.indexer_files);
    println!("   Records from definitions: {}", summary.definition_records);
    println!("   Records from indexers: {}", summary.indexer_records);
    println!("   New trackers written: {}", summary.emitted);
    println!("   Output file: {}", summary.output.display());
    Ok(())
}

async fn run_sync(config: Config, file: Option<PathBuf>, upstream: Option<String>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(|| config.paths.known_dataset.clone());
    let url = upstream.unwrap_or_else(|| config.sync.upstream_url.clone());
    let github = github_client(&config)?;

    let summary = sync_upstream(&github, &url, &path, &config.sync.excluded_fields)
        .await
        .with_context(|| format!("syncing {} from {}", path.display(), url))?;

    println!(
        "Sync complete. Updated: {}, Added: {}",
        summary.updated, summary.added
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref());
    let log_dir = config
        .as_ref()
        .map(|c| c.log_dir.clone())
        .unwrap_or_else(|_| PathBuf::from("logs"));
    let _guard = logging::init_logging(&log_dir);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let token_hint = config.github.token_hint();

    let outcome = match cli.command.unwrap_or(Commands::Harvest {
        known: None,
        output: None,
        branch: None,
    }) {
        Commands::Harvest {
            known,
            output,
            branch,
        } => run_harvest(config, known, output, branch).await,
        Commands::Sync { file, upstream } => run_sync(config, file, upstream).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Unable to complete run: {:#}", e);
            if let Some(hint) = token_hint {
                error!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}
