//! External toolchain detection.
//!
//! The pipeline shells out to `go` and `npm` for everything it does, so both
//! must be present on the search path before any network or filesystem
//! mutation happens. Command names are injectable so tests can force a
//! missing-tool condition without touching the host installation.

use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors that can occur while verifying the external toolchain
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// A required tool is not on the search path
    #[error("`{tool}` not found on PATH. {suggestion}")]
    ToolMissing { tool: String, suggestion: String },
}

pub type ToolchainResult<T> = Result<T, ToolchainError>;

/// Names of the external commands the pipeline invokes
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Go toolchain command
    pub go: String,
    /// npm command used for the markdown post-processor
    pub npm: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            go: "go".to_string(),
            npm: "npm".to_string(),
        }
    }
}

impl ToolchainConfig {
    /// Override the go command name
    pub fn with_go(mut self, go: impl Into<String>) -> Self {
        self.go = go.into();
        self
    }

    /// Override the npm command name
    pub fn with_npm(mut self, npm: impl Into<String>) -> Self {
        self.npm = npm.into();
        self
    }
}

/// Check whether a command responds successfully to its version query
pub fn probe(command: &str, version_arg: &str) -> bool {
    Command::new(command)
        .arg(version_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Verify that both required tools are available.
///
/// Called before the clone and before any output directory is created, so a
/// missing tool aborts the run with no side effects.
pub fn verify_prerequisites(config: &ToolchainConfig) -> ToolchainResult<()> {
    // `go version`, not `go --version`
    if !probe(&config.go, "version") {
        return Err(ToolchainError::ToolMissing {
            tool: config.go.clone(),
            suggestion: "Install the Go toolchain from https://golang.org/dl/ to run the doc generator.".to_string(),
        });
    }

    if !probe(&config.npm, "--version") {
        return Err(ToolchainError::ToolMissing {
            tool: config.npm.clone(),
            suggestion: "Install Node.js and npm to run the markdown post-processor.".to_string(),
        });
    }

    Ok(())
}
