//! Branch capability table.
//!
//! Each upstream release branch maps one-to-one onto a version directory
//! under `content/`. The table also records whether a branch is expected to
//! support CLI reference extraction; the build-marker scan in
//! [`crate::clidocs`] remains the ground truth, and a disagreement between
//! the two is surfaced as a warning by the orchestrator.
//!
//! Older releases are listed but disabled. Re-enabling one for a docs rebuild
//! is a run-time choice (CLI flag or TOML override), not a source edit.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Branch with the bespoke generation sequence: CLI references must be
/// captured before the legacy API directories are pruned
pub const RELEASE_1_6: &str = "release-1.6";

/// API version subtrees deleted from release-1.6 before doc generation.
/// Their presence breaks compilation of the pruned tree and pollutes the
/// generated reference.
pub const LEGACY_API_DIRS: [&str; 6] = [
    "pkg/apis/conductor/v1alpha1",
    "pkg/apis/conductor/v1alpha2",
    "pkg/apis/conductor/v1alpha3",
    "pkg/apis/conductor/v1beta1",
    "pkg/apis/conductor/v1beta2",
    "pkg/apis/conductor/v2alpha1",
];

/// Errors that can occur loading a branch table override
#[derive(Error, Debug)]
pub enum BranchesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid branch table: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type BranchesResult<T> = Result<T, BranchesError>;

/// Whether a branch is expected to support `--help` extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CliSupport {
    /// Branch should build with the CLI framework; extraction is attempted
    Expected,
    /// Branch predates the CLI framework; extraction is not attempted
    None,
}

/// One release branch and its output mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSpec {
    /// Release branch name in the upstream repository
    pub branch: String,
    /// Version directory under `content/`
    pub version_dir: String,
    /// Whether this branch is generated by default
    #[serde(default)]
    pub enabled: bool,
    /// CLI reference expectation for this branch
    pub cli_support: CliSupport,
}

impl BranchSpec {
    fn new(branch: &str, version_dir: &str, enabled: bool, cli_support: CliSupport) -> Self {
        Self {
            branch: branch.to_string(),
            version_dir: version_dir.to_string(),
            enabled,
            cli_support,
        }
    }
}

/// The built-in branch table. Only the current release is enabled; older
/// lines stay listed so a docs rebuild can opt back in.
pub fn default_branches() -> Vec<BranchSpec> {
    vec![
        BranchSpec::new("release-1.4", "v1.4", false, CliSupport::None),
        BranchSpec::new("release-1.5", "v1.5", false, CliSupport::Expected),
        BranchSpec::new(RELEASE_1_6, "v1.6", false, CliSupport::Expected),
        BranchSpec::new("release-1.7", "v1.7", false, CliSupport::Expected),
        BranchSpec::new("release-1.8", "v1.8", true, CliSupport::Expected),
    ]
}

#[derive(Debug, Deserialize)]
struct BranchFile {
    branch: Vec<BranchSpec>,
}

/// Parse a TOML branch table (an array of `[[branch]]` tables)
pub fn parse_branches(contents: &str) -> BranchesResult<Vec<BranchSpec>> {
    let file: BranchFile = toml::from_str(contents)?;
    Ok(file.branch)
}

/// Load a branch table override from disk
pub fn load_branches(path: &Path) -> BranchesResult<Vec<BranchSpec>> {
    let contents = std::fs::read_to_string(path)?;
    parse_branches(&contents)
}
