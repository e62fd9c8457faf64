//! CLI reference extraction.
//!
//! Captures `--help` output from the upstream commands and wraps it in a
//! markdown document with front matter. This stage is best effort: older
//! branches predate the cobra flag handling, move their entry points around,
//! or lack them entirely, and each of those conditions is a designed skip
//! with a logged notice, never a failure of the run.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{info, warn};

/// Dependency declaration that signals `--help` support in the upstream
pub const CLI_FRAMEWORK_PATTERN: &str = r"github\.com/spf13/cobra";

/// Errors that can occur during CLI reference extraction.
///
/// Skip conditions are not errors; see [`CliSkip`].
#[derive(Error, Debug)]
pub enum CliDocsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid CLI framework pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("`go run {entry}` failed: {reason}")]
    HelpFailed { entry: String, reason: String },
}

pub type CliDocsResult<T> = Result<T, CliDocsError>;

/// One command to extract help text from
#[derive(Debug, Clone)]
pub struct CommandTarget {
    /// Version directory under `content/` the output belongs to
    pub version_dir: String,
    /// Checkout-relative path of the command's main source file
    pub entry_point: PathBuf,
    /// Command name; doubles as the output file base name
    pub name: String,
}

impl CommandTarget {
    pub fn new(
        version_dir: impl Into<String>,
        entry_point: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            version_dir: version_dir.into(),
            entry_point: entry_point.into(),
            name: name.into(),
        }
    }
}

/// Why a command target was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliSkip {
    /// The expected main source file is absent on this branch
    MissingEntryPoint,
    /// Neither application layout directory is present
    NoAppLayout,
    /// The build marker does not declare the CLI framework dependency
    NoCliFramework,
}

impl std::fmt::Display for CliSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliSkip::MissingEntryPoint => write!(f, "entry point not present"),
            CliSkip::NoAppLayout => write!(f, "no application layout directory"),
            CliSkip::NoCliFramework => write!(f, "build marker lacks the CLI framework"),
        }
    }
}

/// Result of one extraction attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliOutcome {
    /// Reference document written to the given path
    Written(PathBuf),
    /// Target skipped; unsupported version, not an error
    Skipped(CliSkip),
}

/// Application layouts the upstream has used across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Modern `cmd/<name>` layout, declared in `go.mod`
    Cmd,
    /// Legacy `app/<name>` layout, declared in `Gopkg.toml`
    App,
}

impl Layout {
    fn detect(checkout_root: &Path, name: &str) -> Option<Self> {
        if checkout_root.join("cmd").join(name).is_dir() {
            Some(Layout::Cmd)
        } else if checkout_root.join("app").join(name).is_dir() {
            Some(Layout::App)
        } else {
            None
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Layout::Cmd => "go.mod",
            Layout::App => "Gopkg.toml",
        }
    }
}

/// Check whether a build marker file declares the CLI framework dependency.
///
/// An absent marker counts as "does not declare"; the heuristic stands in for
/// "this version understands `--help`".
pub fn marker_declares_cli(marker: &Path) -> CliDocsResult<bool> {
    if !marker.exists() {
        return Ok(false);
    }
    let contents = std::fs::read_to_string(marker)?;
    let pattern = Regex::new(CLI_FRAMEWORK_PATTERN)?;
    Ok(pattern.is_match(&contents))
}

/// Front matter for a command reference page
pub fn render_front_matter(name: &str) -> String {
    format!(
        "---\ntitle: \"conductor {name}\"\ndescription: \"Command line reference for {name}\"\n---\n"
    )
}

/// Assemble the full reference document around the captured help text
pub fn render_reference(name: &str, help_text: &str) -> String {
    let mut doc = render_front_matter(name);
    doc.push_str("\n```\n");
    doc.push_str(help_text.trim_end());
    doc.push_str("\n```\n");
    doc
}

/// Extract the help text for one command target.
///
/// Runs the guard sequence, then `go run <package> --help`, and writes
/// `content/<version>/cli/<name>.md`. Skips produce no output file.
pub fn generate(
    go: &str,
    workspace_env: &[(String, String)],
    checkout_root: &Path,
    target: &CommandTarget,
    content_dir: &Path,
) -> CliDocsResult<CliOutcome> {
    let entry = checkout_root.join(&target.entry_point);
    if !entry.exists() {
        warn!(
            "Skipping CLI reference for {}: {} not present on this branch",
            target.name,
            target.entry_point.display()
        );
        return Ok(CliOutcome::Skipped(CliSkip::MissingEntryPoint));
    }

    let Some(layout) = Layout::detect(checkout_root, &target.name) else {
        warn!(
            "Skipping CLI reference for {}: no cmd/ or app/ layout directory",
            target.name
        );
        return Ok(CliOutcome::Skipped(CliSkip::NoAppLayout));
    };

    let marker = checkout_root.join(layout.marker());
    if !marker_declares_cli(&marker)? {
        warn!(
            "Skipping CLI reference for {}: {} does not declare the CLI framework",
            target.name,
            layout.marker()
        );
        return Ok(CliOutcome::Skipped(CliSkip::NoCliFramework));
    }

    // go run wants the package directory, not the source file
    let package = entry.parent().unwrap_or(checkout_root);
    let output = Command::new(go)
        .arg("run")
        .arg(package)
        .arg("--help")
        .current_dir(checkout_root)
        .envs(workspace_env.iter().cloned())
        .output()?;

    if !output.status.success() {
        return Err(CliDocsError::HelpFailed {
            entry: target.entry_point.display().to_string(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let help_text = String::from_utf8_lossy(&output.stdout);
    let dest_dir = content_dir.join(&target.version_dir).join("cli");
    std::fs::create_dir_all(&dest_dir)?;
    let dest = dest_dir.join(format!("{}.md", target.name));
    std::fs::write(&dest, render_reference(&target.name, &help_text))?;
    info!("Wrote {}", dest.display());

    Ok(CliOutcome::Written(dest))
}
