//! Upstream source checkout.
//!
//! One clone of the upstream repository is shared by every branch pass. The
//! working tree is positioned with a destructive fetch + hard reset, so any
//! local edits or leftovers from a previous branch are discarded. Callers
//! serialize branch work by construction; the tree does not support
//! concurrent checkouts.

use git2::build::CheckoutBuilder;
use git2::{Repository, ResetType};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

/// Upstream repository cloned by the pipeline, read-only
pub const UPSTREAM_URL: &str = "https://github.com/conductor-project/conductor";

/// GOPATH-relative import path of the upstream repository
pub const UPSTREAM_PATH: &str = "github.com/conductor-project/conductor";

/// Errors that can occur during checkout operations
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Branch not found on origin: {0}")]
    BranchNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`go mod vendor` failed: {0}")]
    VendorFailed(String),
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// A local clone of the upstream repository
pub struct SourceCheckout {
    repo: Repository,
    root: PathBuf,
}

impl SourceCheckout {
    /// Open an existing clone at `dest`, or clone `url` fresh
    pub fn clone_or_open(url: &str, dest: &Path) -> CheckoutResult<Self> {
        let repo = if dest.join(".git").exists() {
            debug!("Reusing existing clone at {}", dest.display());
            Repository::open(dest)?
        } else {
            info!("Cloning {} into {}", url, dest.display());
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Repository::clone(url, dest)?
        };

        Ok(Self {
            repo,
            root: dest.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fetch `branch` from origin and hard-reset the working tree to it.
    ///
    /// Discards all local modifications and untracked files. Idempotent per
    /// branch; repeated calls re-fetch and re-reset.
    pub fn reset_to_branch(&self, branch: &str) -> CheckoutResult<()> {
        info!("Resetting checkout to origin/{}", branch);

        let mut remote = self.repo.find_remote("origin")?;
        remote.fetch(&[branch], None, None)?;

        let refname = format!("refs/remotes/origin/{}", branch);
        let reference = self
            .repo
            .find_reference(&refname)
            .map_err(|_| CheckoutError::BranchNotFound(branch.to_string()))?;
        let commit = reference.peel_to_commit()?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        self.repo
            .reset(commit.as_object(), ResetType::Hard, Some(&mut checkout))?;

        Ok(())
    }

    /// Delete the vendor directory and regenerate it with `go mod vendor`
    pub fn regenerate_vendor(&self, go: &str, env: &[(String, String)]) -> CheckoutResult<()> {
        let vendor = self.root.join("vendor");
        if vendor.exists() {
            std::fs::remove_dir_all(&vendor)?;
        }

        info!("Regenerating vendor directory in {}", self.root.display());
        let output = Command::new(go)
            .args(["mod", "vendor"])
            .current_dir(&self.root)
            .envs(env.iter().cloned())
            .output()?;

        if !output.status.success() {
            return Err(CheckoutError::VendorFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        Ok(())
    }

    /// Remove a fixed set of subdirectories from the working tree.
    ///
    /// Missing entries are fine; only directories that exist are deleted.
    pub fn prune_dirs<I, P>(&self, dirs: I) -> CheckoutResult<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for dir in dirs {
            let path = self.root.join(dir.as_ref());
            if path.exists() {
                info!("Pruning {}", path.display());
                std::fs::remove_dir_all(path)?;
            }
        }
        Ok(())
    }
}
