use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tree_diff::{HashAlgorithm, Report, TreeWalker};

mod config;
mod telemetry;

use config::TreeDiffConfig;

#[derive(Parser)]
#[command(name = "tree-diff")]
#[command(about = "Compare two filesystem trees and print the differences as JSON")]
#[command(version)]
struct Cli {
    /// First tree (entries only here are reported as deleted)
    dir1: PathBuf,

    /// Second tree (entries only here are reported as added)
    dir2: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content hash algorithm (sha256, blake3)
    #[arg(long, value_name = "ALGORITHM")]
    hash: Option<HashAlgorithm>,

    /// Report skipped entries under "errors" instead of ignoring them
    #[arg(long)]
    strict: bool,

    /// Sort added and deleted paths
    #[arg(long)]
    sorted: bool,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,

    /// Exit with status 1 when the trees differ
    #[arg(long)]
    exit_code: bool,

    /// Abort if the comparison takes longer than this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Layer command-line flags over the file configuration
    fn apply_to(&self, config: &mut TreeDiffConfig) {
        if let Some(hash) = self.hash {
            config.compare.hash_algorithm = hash;
        }
        config.compare.strict |= self.strict;
        config.output.sorted |= self.sorted;
        config.output.pretty |= self.pretty;
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        config.logging.json |= self.log_json;
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(2);
        }
    };

    let result = runtime.block_on(run(cli));
    // A walker abandoned by --timeout may still be blocked in the filesystem
    runtime.shutdown_background();

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = TreeDiffConfig::discover(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    telemetry::init_logging(&config.logging)?;

    info!("Comparing {} against {}", cli.dir1.display(), cli.dir2.display());

    let mut report = compare(&cli, &config).await?;
    if config.output.sorted {
        report.sort();
    }

    println!("{}", report.to_json(config.output.pretty)?);

    if cli.exit_code && !report.is_empty() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Run the synchronous walker on a blocking thread, under the optional
/// wall-clock limit
async fn compare(cli: &Cli, config: &TreeDiffConfig) -> Result<Report> {
    let walker = TreeWalker::new(config.compare.clone());
    let (dir1, dir2) = (cli.dir1.clone(), cli.dir2.clone());
    let task = tokio::task::spawn_blocking(move || walker.diff_paths(dir1, dir2));

    let joined = match cli.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), task)
            .await
            .map_err(|_| anyhow!("comparison did not finish within {} seconds", secs))?,
        None => task.await,
    };

    let report = joined.context("comparison task failed")??;
    Ok(report)
}
