//! Export stage: publish the build outputs for later pipeline steps.

use std::path::{Path, PathBuf};

use patrol_step_sdk::{
    ArtifactSink, BuildConfiguration, CommandExecutor, Printer, StepError, export_artifacts,
};

pub fn run(
    executor: &dyn CommandExecutor,
    sink: &dyn ArtifactSink,
    printer: Printer,
    project_root: &Path,
    config: &BuildConfiguration,
) -> Result<Vec<PathBuf>, StepError> {
    printer.step_initiated("--- Getting Patrol builds ---");
    let exported = export_artifacts(
        project_root,
        config.platform(),
        config.build_type(),
        executor,
        sink,
        printer,
    )?;
    printer.step_completed(&format!("✅ Exported {} artifact(s)", exported.len()));
    Ok(exported)
}
