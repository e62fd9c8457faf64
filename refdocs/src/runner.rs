//! Sequential orchestration of the documentation pipeline.
//!
//! Fail-fast: the first fatal stage error aborts the remainder of the run.
//! CLI reference skips are the one designed exception. The Go workspace
//! guard cleans up on every exit path, including mid-run failure.

use chrono::{DateTime, Utc};
use pipeline::{
    default_branches, generate_api_docs, generate_cli_reference, verify_prerequisites,
    ApiDocsConfig, ApiDocsError, BranchSpec, BranchesError, CheckoutError, CliDocsError,
    CliOutcome, CliSupport, CommandTarget, GoWorkspace, SourceCheckout, ToolchainConfig,
    ToolchainError, WorkspaceError, LEGACY_API_DIRS, RELEASE_1_6, UPSTREAM_PATH, UPSTREAM_URL,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Toolchain check failed: {0}")]
    Toolchain(#[from] ToolchainError),

    #[error("Workspace setup failed: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("API doc generation failed: {0}")]
    ApiDocs(#[from] ApiDocsError),

    #[error("CLI reference generation failed: {0}")]
    CliDocs(#[from] CliDocsError),

    #[error("Branch table error: {0}")]
    Branches(#[from] BranchesError),

    #[error("Unknown branch `{name}`; not in the branch table")]
    UnknownBranch { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Website root holding `content/` and `tools/`
    pub root: PathBuf,
    /// Upstream repository to clone
    pub upstream_url: String,
    /// External command names
    pub toolchain: ToolchainConfig,
    /// Branch capability table
    pub branches: Vec<BranchSpec>,
    /// Leave the temporary Go workspace in place after the run
    pub keep_temp: bool,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            upstream_url: UPSTREAM_URL.to_string(),
            toolchain: ToolchainConfig::default(),
            branches: default_branches(),
            keep_temp: false,
        }
    }
}

/// Mark the named branches enabled, failing on names the table does not know
pub fn enable_branches(branches: &mut [BranchSpec], names: &[String]) -> PipelineResult<()> {
    for name in names {
        let Some(spec) = branches.iter_mut().find(|b| &b.branch == name) else {
            return Err(PipelineError::UnknownBranch { name: name.clone() });
        };
        spec.enabled = true;
    }
    Ok(())
}

/// Per-command result within a branch
#[derive(Debug, Serialize)]
pub struct CliReport {
    pub name: String,
    pub status: String,
}

/// Everything generated for one branch
#[derive(Debug, Serialize)]
pub struct BranchOutcome {
    pub branch: String,
    pub version_dir: String,
    pub api_docs: PathBuf,
    pub cli: Vec<CliReport>,
}

/// Record of a completed run
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub branches: Vec<BranchOutcome>,
}

/// The fixed set of commands whose help text is extracted
fn cli_targets(spec: &BranchSpec) -> Vec<CommandTarget> {
    vec![
        CommandTarget::new(
            spec.version_dir.clone(),
            "cmd/conductor/main.go",
            "conductor",
        ),
        CommandTarget::new(
            spec.version_dir.clone(),
            "cmd/conductorctl/main.go",
            "conductorctl",
        ),
    ]
}

/// Run the full pipeline over every enabled branch
pub fn run(config: &RunConfig) -> PipelineResult<RunSummary> {
    let started = Utc::now();

    // Before any network traffic or filesystem mutation
    verify_prerequisites(&config.toolchain)?;

    let enabled: Vec<&BranchSpec> = config.branches.iter().filter(|b| b.enabled).collect();
    if enabled.is_empty() {
        warn!("No branches enabled; nothing to generate");
    }

    let workspace = GoWorkspace::create(&config.toolchain)?.with_keep(config.keep_temp);
    workspace.install_generator()?;
    let env = workspace.command_env();

    let checkout_dest = workspace.clone_root(UPSTREAM_PATH);
    let checkout = SourceCheckout::clone_or_open(&config.upstream_url, &checkout_dest)?;

    let content_dir = config.root.join("content");
    let apidocs_config = ApiDocsConfig::for_root(&config.root, &config.toolchain.npm);

    let mut outcomes = Vec::new();
    for spec in enabled {
        info!(
            "Generating documentation for {} -> content/{}",
            spec.branch, spec.version_dir
        );
        checkout.reset_to_branch(&spec.branch)?;
        checkout.regenerate_vendor(&config.toolchain.go, &env)?;

        let outcome = if spec.branch == RELEASE_1_6 {
            // Help extraction must see the legacy API trees; prune them only
            // afterwards, then generate the API reference from the pruned
            // (compilable) tree.
            let cli = extract_cli_references(config, &env, &checkout, spec, &content_dir)?;
            checkout.prune_dirs(LEGACY_API_DIRS)?;
            let api_docs = generate_api_docs(
                &workspace.generator_bin(),
                &env,
                checkout.root(),
                &apidocs_config,
                &spec.version_dir,
                &content_dir,
            )?;
            BranchOutcome {
                branch: spec.branch.clone(),
                version_dir: spec.version_dir.clone(),
                api_docs,
                cli,
            }
        } else {
            let api_docs = generate_api_docs(
                &workspace.generator_bin(),
                &env,
                checkout.root(),
                &apidocs_config,
                &spec.version_dir,
                &content_dir,
            )?;
            let cli = extract_cli_references(config, &env, &checkout, spec, &content_dir)?;
            BranchOutcome {
                branch: spec.branch.clone(),
                version_dir: spec.version_dir.clone(),
                api_docs,
                cli,
            }
        };
        outcomes.push(outcome);
    }

    let summary = RunSummary {
        started,
        finished: Utc::now(),
        branches: outcomes,
    };
    info!(
        "Run complete: {} branch(es) generated",
        summary.branches.len()
    );
    Ok(summary)
}

fn extract_cli_references(
    config: &RunConfig,
    env: &[(String, String)],
    checkout: &SourceCheckout,
    spec: &BranchSpec,
    content_dir: &std::path::Path,
) -> PipelineResult<Vec<CliReport>> {
    if spec.cli_support == CliSupport::None {
        info!(
            "CLI references disabled for {} by the capability table",
            spec.branch
        );
        return Ok(Vec::new());
    }

    let mut reports = Vec::new();
    for target in cli_targets(spec) {
        let outcome = generate_cli_reference(
            &config.toolchain.go,
            env,
            checkout.root(),
            &target,
            content_dir,
        )?;
        let status = match &outcome {
            CliOutcome::Written(path) => format!("written: {}", path.display()),
            CliOutcome::Skipped(reason) => {
                // The table said Expected; the tree disagreed. Surface the
                // mismatch so a future layout change is visible.
                warn!(
                    "Capability table expected CLI support on {} but {}: {}",
                    spec.branch, target.name, reason
                );
                format!("skipped: {}", reason)
            }
        };
        reports.push(CliReport {
            name: target.name,
            status,
        });
    }
    Ok(reports)
}
