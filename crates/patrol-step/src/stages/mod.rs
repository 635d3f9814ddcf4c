//! The four stages of the step, in execution order.
//!
//! Each stage is a plain function over an injected
//! [`CommandExecutor`](patrol_step_sdk::CommandExecutor) that returns a
//! [`StepError`](patrol_step_sdk::StepError); sequencing and failure
//! reporting live in [`pipeline`].

use std::fmt;

pub mod build;
pub mod export;
pub mod install;
pub mod pipeline;
pub mod validate;

pub use pipeline::{Pipeline, PipelineReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Install,
    Validate,
    Build,
    Export,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Install => "install",
            Stage::Validate => "validate",
            Stage::Build => "build",
            Stage::Export => "export",
        }
    }

    /// Banner printed when the stage fails.
    pub fn failure_banner(&self) -> &'static str {
        match self {
            Stage::Install => "❌ Setup failed",
            Stage::Validate => "❌ Validation failed",
            Stage::Build => "❌ Build failed",
            Stage::Export => "❌ Export failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
