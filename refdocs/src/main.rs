use clap::Parser;
use pipeline::load_branches;
use refdocs::{enable_branches, run, RunConfig};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "refdocs")]
#[command(about = "Regenerate conductor API and CLI reference documentation")]
struct Cli {
    /// Website root containing content/ and tools/ (defaults to $REFDOCS_ROOT, then ".")
    #[arg(long)]
    root: Option<PathBuf>,
    /// Enable an additional release branch for this run (repeatable)
    #[arg(long = "branch")]
    branches: Vec<String>,
    /// TOML file replacing the built-in branch table
    #[arg(long)]
    branches_file: Option<PathBuf>,
    /// Leave the temporary Go workspace in place for debugging
    #[arg(long)]
    keep_temp: bool,
    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run_cli(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let root = cli
        .root
        .or_else(|| std::env::var_os("REFDOCS_ROOT").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = RunConfig::new(root);
    config.keep_temp = cli.keep_temp;
    if let Some(path) = &cli.branches_file {
        config.branches = load_branches(path)?;
    }
    enable_branches(&mut config.branches, &cli.branches)?;

    let summary = run(&config)?;

    for outcome in &summary.branches {
        info!(
            "{}: api docs at {}, {} CLI target(s)",
            outcome.branch,
            outcome.api_docs.display(),
            outcome.cli.len()
        );
    }
    if let Some(path) = &cli.summary {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        info!("Wrote run summary to {}", path.display());
    }

    Ok(())
}
