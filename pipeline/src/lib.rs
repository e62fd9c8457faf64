//! Pipeline stages for the conductor reference documentation generator.
//!
//! Everything here is sequential, blocking orchestration of external tools:
//! `go`, `npm`, `git`, the pinned `gen-apidocs` generator, and the upstream
//! commands' own help output. The binary crate (`refdocs`) wires the stages
//! together; this crate keeps each stage independently usable and testable.

pub mod apidocs;
pub mod branches;
pub mod checkout;
pub mod clidocs;
pub mod toolchain;
pub mod workspace;

pub use apidocs::{generate as generate_api_docs, ApiDocsConfig, ApiDocsError};
pub use branches::{
    default_branches, load_branches, BranchSpec, BranchesError, CliSupport, LEGACY_API_DIRS,
    RELEASE_1_6,
};
pub use checkout::{CheckoutError, SourceCheckout, UPSTREAM_PATH, UPSTREAM_URL};
pub use clidocs::{
    generate as generate_cli_reference, CliDocsError, CliOutcome, CliSkip, CommandTarget,
};
pub use toolchain::{verify_prerequisites, ToolchainConfig, ToolchainError};
pub use workspace::{GoWorkspace, WorkspaceError, GENERATOR_MODULE, GENERATOR_VERSION};
