//! Isolated Go workspace for a single pipeline run.
//!
//! Doc generation downloads modules and installs a generator binary; none of
//! that should land in the caller's GOPATH. Each run gets a throwaway module
//! cache and build cache, handed to every spawned command through its
//! environment, and torn down when the workspace is dropped.
//!
//! The module cache is written read-only by the Go toolchain, so teardown has
//! to go through `go clean -modcache` before the directories can be deleted.

use crate::toolchain::ToolchainConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{info, warn};

/// Module path of the API reference generator
pub const GENERATOR_MODULE: &str = "github.com/conductor-project/reference-docs/gen-apidocs";

/// Pinned generator version installed for every run
pub const GENERATOR_VERSION: &str = "v1.2.0";

/// Errors that can occur while setting up the Go workspace
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Workspace directory creation or command spawn failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `go install` of the generator failed
    #[error("Failed to install {module}@{version}: {reason}")]
    InstallFailed {
        module: String,
        version: String,
        reason: String,
    },
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Throwaway GOPATH/GOCACHE pair for one run
#[derive(Debug)]
pub struct GoWorkspace {
    gopath: PathBuf,
    gocache: PathBuf,
    go: String,
    keep: bool,
}

impl GoWorkspace {
    /// Create the temporary directory pair under the system temp dir
    pub fn create(toolchain: &ToolchainConfig) -> WorkspaceResult<Self> {
        // Create both before disarming either, so a failure on the second
        // still deletes the first.
        let gopath_dir = tempfile::Builder::new()
            .prefix("refdocs-gopath-")
            .tempdir()?;
        let gocache_dir = tempfile::Builder::new()
            .prefix("refdocs-gocache-")
            .tempdir()?;
        let gopath = gopath_dir.keep();
        let gocache = gocache_dir.keep();
        info!(
            "Created Go workspace: GOPATH={} GOCACHE={}",
            gopath.display(),
            gocache.display()
        );

        Ok(Self {
            gopath,
            gocache,
            go: toolchain.go.clone(),
            keep: false,
        })
    }

    /// Leave the directories in place on drop, for debugging failed runs
    pub fn with_keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn gopath(&self) -> &Path {
        &self.gopath
    }

    pub fn gocache(&self) -> &Path {
        &self.gocache
    }

    /// Directory the pinned generator binary is installed into
    pub fn gobin(&self) -> PathBuf {
        self.gopath.join("bin")
    }

    /// Checkout destination for the upstream source, GOPATH-style
    pub fn clone_root(&self, upstream_path: &str) -> PathBuf {
        self.gopath.join("src").join(upstream_path)
    }

    /// Environment applied to every go/npm/generator child process.
    ///
    /// The host process environment is never mutated; only children see the
    /// workspace paths.
    pub fn command_env(&self) -> Vec<(String, String)> {
        vec![
            ("GOPATH".to_string(), self.gopath.display().to_string()),
            ("GOCACHE".to_string(), self.gocache.display().to_string()),
            ("GOBIN".to_string(), self.gobin().display().to_string()),
            ("GOFLAGS".to_string(), "-mod=mod".to_string()),
        ]
    }

    /// Install the pinned doc generator into the workspace GOBIN
    pub fn install_generator(&self) -> WorkspaceResult<PathBuf> {
        let spec = format!("{}@{}", GENERATOR_MODULE, GENERATOR_VERSION);
        info!("Installing doc generator {}", spec);

        let output = Command::new(&self.go)
            .args(["install", &spec])
            .envs(self.command_env())
            .output()
            .map_err(|e| WorkspaceError::InstallFailed {
                module: GENERATOR_MODULE.to_string(),
                version: GENERATOR_VERSION.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(WorkspaceError::InstallFailed {
                module: GENERATOR_MODULE.to_string(),
                version: GENERATOR_VERSION.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(self.generator_bin())
    }

    /// Path of the installed generator binary
    pub fn generator_bin(&self) -> PathBuf {
        self.gobin().join("gen-apidocs")
    }
}

impl Drop for GoWorkspace {
    fn drop(&mut self) {
        if self.keep {
            warn!(
                "Keeping Go workspace: GOPATH={} GOCACHE={}",
                self.gopath.display(),
                self.gocache.display()
            );
            return;
        }

        // Unlock the read-only module cache before deleting anything.
        let _ = Command::new(&self.go)
            .args(["clean", "-modcache"])
            .envs(self.command_env())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        let _ = std::fs::remove_dir_all(&self.gopath);
        let _ = std::fs::remove_dir_all(&self.gocache);
    }
}
