pub mod runner;

pub use runner::{
    enable_branches, run, BranchOutcome, CliReport, PipelineError, PipelineResult, RunConfig,
    RunSummary,
};
