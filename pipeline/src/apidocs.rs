//! API reference generation.
//!
//! Runs the installed `gen-apidocs` binary against the checkout's API package
//! tree, pipes the resulting markdown through the npm-hosted post-processor,
//! and writes the final document under `content/<version>/reference/`.
//! Both sub-steps are fatal on non-zero exit; the generator has a hard
//! dependency on the tree being compilable at the moment of invocation.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::info;

/// Errors that can occur during API doc generation
#[derive(Error, Debug)]
pub enum ApiDocsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gen-apidocs failed: {0}")]
    GeneratorFailed(String),

    #[error("Generator produced no output at {0}")]
    MissingOutput(String),

    #[error("Post-processed reference for {0} is empty")]
    EmptyOutput(String),

    #[error("Post-processor argv is empty")]
    EmptyPostprocess,

    #[error("Post-processor failed: {0}")]
    PostprocessFailed(String),
}

pub type ApiDocsResult<T> = Result<T, ApiDocsError>;

/// Generator inputs and the post-processor command line
#[derive(Debug, Clone)]
pub struct ApiDocsConfig {
    /// Generator configuration directory
    pub config_dir: PathBuf,
    /// Generator template directory
    pub template_dir: PathBuf,
    /// Post-processor argv; generator output is piped through its stdin
    pub postprocess: Vec<String>,
}

impl ApiDocsConfig {
    /// Standard layout under the website root: generator inputs live in
    /// `tools/gen-apidocs/`, the formatter is an npm script in
    /// `tools/postprocess/`.
    pub fn for_root(root: &Path, npm: &str) -> Self {
        Self {
            config_dir: root.join("tools/gen-apidocs/config"),
            template_dir: root.join("tools/gen-apidocs/templates"),
            postprocess: vec![
                npm.to_string(),
                "--prefix".to_string(),
                root.join("tools/postprocess").display().to_string(),
                "run".to_string(),
                "--silent".to_string(),
                "format".to_string(),
            ],
        }
    }

    /// Replace the post-processor command line
    pub fn with_postprocess(mut self, argv: Vec<String>) -> Self {
        self.postprocess = argv;
        self
    }
}

/// Generate `content/<version>/reference/api-docs.md` for the current checkout
pub fn generate(
    generator_bin: &Path,
    workspace_env: &[(String, String)],
    checkout_root: &Path,
    config: &ApiDocsConfig,
    version_dir: &str,
    content_dir: &Path,
) -> ApiDocsResult<PathBuf> {
    let scratch = tempfile::tempdir()?;
    let raw_path = scratch.path().join("api-docs.md");

    info!(
        "Generating API reference for {} into {}",
        checkout_root.display(),
        version_dir
    );
    let output = Command::new(generator_bin)
        .arg("--api-dir")
        .arg(checkout_root.join("pkg/apis"))
        .arg("--config-dir")
        .arg(&config.config_dir)
        .arg("--template-dir")
        .arg(&config.template_dir)
        .arg("--out-file")
        .arg(&raw_path)
        .current_dir(checkout_root)
        .envs(workspace_env.iter().cloned())
        .output()?;

    if !output.status.success() {
        return Err(ApiDocsError::GeneratorFailed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }
    if !raw_path.exists() {
        return Err(ApiDocsError::MissingOutput(raw_path.display().to_string()));
    }

    let formatted = postprocess(&config.postprocess, &raw_path)?;
    if formatted.is_empty() {
        return Err(ApiDocsError::EmptyOutput(version_dir.to_string()));
    }

    let dest_dir = content_dir.join(version_dir).join("reference");
    std::fs::create_dir_all(&dest_dir)?;
    let dest = dest_dir.join("api-docs.md");
    std::fs::write(&dest, formatted)?;
    info!("Wrote {}", dest.display());

    Ok(dest)
}

/// Pipe `input` through the post-processor and capture its stdout
pub fn postprocess(argv: &[String], input: &Path) -> ApiDocsResult<Vec<u8>> {
    let (program, args) = argv.split_first().ok_or(ApiDocsError::EmptyPostprocess)?;

    let file = File::open(input)?;
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::from(file))
        .output()?;

    if !output.status.success() {
        return Err(ApiDocsError::PostprocessFailed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    Ok(output.stdout)
}
