//! Pipeline driver: install -> validate -> build -> export.
//!
//! Every stage runs at most once and the first failure aborts the rest. A
//! failing stage prints its banner and the error is returned with
//! `"<stage> stage failed"` as context.

use std::path::PathBuf;

use anyhow::Result;
use patrol_step_sdk::{
    ArtifactSink, BuildConfiguration, CommandExecutor, CompatibilityTable, Printer,
    SemanticVersion, StepError, VersionSet,
};
use tracing::info;

use super::{Stage, build, export, install, validate};
use crate::inputs::StepInputs;

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub versions: VersionSet,
    pub build: BuildConfiguration,
    /// Absolute paths of the exported artifacts, in export order.
    pub exported: Vec<PathBuf>,
}

/// Runs the stages against one executor and export sink.
pub struct Pipeline<'a> {
    executor: &'a dyn CommandExecutor,
    sink: &'a dyn ArtifactSink,
    printer: Printer,
    project_root: PathBuf,
    compatibility: Option<CompatibilityTable>,
}

impl<'a> Pipeline<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, sink: &'a dyn ArtifactSink) -> Self {
        Self {
            executor,
            sink,
            printer: Printer::plain(),
            project_root: PathBuf::from("."),
            compatibility: None,
        }
    }

    pub fn printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    /// Flutter project whose build outputs are exported.
    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Compatibility policy for the validate stage; `None` enforces nothing.
    pub fn compatibility(mut self, table: Option<CompatibilityTable>) -> Self {
        self.compatibility = table;
        self
    }

    /// Runs all four stages.
    pub fn run(&self, inputs: &StepInputs) -> Result<PipelineReport> {
        let cli_version = self.install(inputs)?;
        let versions = self.validate(cli_version)?;
        let build = self.build(inputs)?;
        let exported = self.stage(Stage::Export, || {
            export::run(
                self.executor,
                self.sink,
                self.printer,
                &self.project_root,
                &build,
            )
        })?;

        info!(exported = exported.len(), "pipeline finished");
        Ok(PipelineReport {
            versions,
            build,
            exported,
        })
    }

    pub fn install(&self, inputs: &StepInputs) -> Result<SemanticVersion> {
        let version = self.stage(Stage::Install, || {
            install::run(
                self.executor,
                self.printer,
                inputs.custom_cli_version.as_deref(),
            )
        })?;
        self.printer
            .success("✅ Installing CLI Completed Successfully");
        Ok(version)
    }

    pub fn validate(&self, cli_version: SemanticVersion) -> Result<VersionSet> {
        self.stage(Stage::Validate, || {
            validate::run(
                self.executor,
                self.printer,
                cli_version,
                self.compatibility.as_ref(),
            )
        })
    }

    /// Validates against the CLI that is already installed, without
    /// installing one.
    pub fn validate_installed(&self) -> Result<VersionSet> {
        self.stage(Stage::Validate, || {
            let cli_version = install::cli_version(self.executor)?;
            validate::run(
                self.executor,
                self.printer,
                cli_version,
                self.compatibility.as_ref(),
            )
        })
    }

    /// Parses the build inputs and runs the build commands.
    pub fn build(&self, inputs: &StepInputs) -> Result<BuildConfiguration> {
        self.stage(Stage::Build, || {
            let config = self.build_configuration(inputs)?;
            build::run(self.executor, self.printer, &config)?;
            Ok(config)
        })
    }

    /// Exports the outputs of a previous build.
    pub fn export(&self, inputs: &StepInputs) -> Result<Vec<PathBuf>> {
        self.stage(Stage::Export, || {
            let config = self.build_configuration(inputs)?;
            export::run(
                self.executor,
                self.sink,
                self.printer,
                &self.project_root,
                &config,
            )
        })
    }

    fn build_configuration(&self, inputs: &StepInputs) -> Result<BuildConfiguration, StepError> {
        inputs.build_configuration().map_err(|err| {
            self.printer
                .error(&format!("❌ Failed to retrieve build commands: {}", err));
            StepError::from(err)
        })
    }

    fn stage<T>(&self, stage: Stage, body: impl FnOnce() -> Result<T, StepError>) -> Result<T> {
        info!(stage = %stage, "starting stage");
        body().map_err(|err| {
            self.printer.error(stage.failure_banner());
            anyhow::Error::new(err).context(format!("{} stage failed", stage))
        })
    }
}
