//! Android artifact export
//!
//! Finds the app APK and the instrumentation (androidTest) APK produced by
//! `patrol build android` and copies them into `patrol/android`.

use std::path::PathBuf;

use regex::Regex;

use super::ArtifactSink;
use super::common::{copy_artifacts, find_first_file};
use crate::executor::CommandExecutor;
use crate::keys::exports;
use crate::print::Printer;
use crate::types::{ArtifactDescriptor, BuildType, StepError};

/// Gradle output root of a Flutter app.
pub const APK_OUTPUT_DIR: &str = "build/app/outputs/apk";
/// Folder the APKs are copied into.
pub const ANDROID_ARTIFACTS_DIR: &str = "patrol/android";

/// Locates and exports Android test APKs.
pub struct AndroidExporter {
    /// Root of the Flutter project
    project_root: PathBuf,
    printer: Printer,
}

impl AndroidExporter {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            printer: Printer::plain(),
        }
    }

    pub fn printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    /// Directories searched for the (instrumentation, app) APKs.
    pub fn apk_search_paths(&self, build_type: BuildType) -> (PathBuf, PathBuf) {
        let outputs = self.project_root.join(APK_OUTPUT_DIR);
        let variant = build_type.as_str();
        (
            outputs.join("androidTest").join(variant),
            outputs.join(variant),
        )
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.project_root.join(ANDROID_ARTIFACTS_DIR)
    }

    /// Finds the APKs for `build_type`.
    ///
    /// A missing instrumentation or app APK is reported as a warning; finding
    /// neither is a [`StepError::NotFound`].
    pub fn discover(&self, build_type: BuildType) -> Result<Vec<ArtifactDescriptor>, StepError> {
        let (test_dir, app_dir) = self.apk_search_paths(build_type);
        let destination = self.artifacts_dir();
        let mut artifacts = Vec::with_capacity(2);

        match find_first_file(&test_dir, &instrumentation_apk_pattern()?)? {
            Some(apk) => artifacts.push(ArtifactDescriptor::new(
                apk,
                &destination,
                Some(exports::ANDROID_INSTRUMENTATION_APK_PATH),
            )),
            None => self.printer.warning(&format!(
                "No instrumentation APK found in {}",
                test_dir.display()
            )),
        }

        match find_first_file(&app_dir, &app_apk_pattern(build_type)?)? {
            Some(apk) => artifacts.push(ArtifactDescriptor::new(
                apk,
                &destination,
                Some(exports::ANDROID_APK_PATH),
            )),
            None => self
                .printer
                .warning(&format!("No app APK found in {}", app_dir.display())),
        }

        if artifacts.is_empty() {
            return Err(StepError::NotFound(format!(
                "Android/Test APK files under {}",
                self.project_root.join(APK_OUTPUT_DIR).display()
            )));
        }
        Ok(artifacts)
    }

    /// Discovers, copies and publishes the APKs.
    pub fn export(
        &self,
        build_type: BuildType,
        executor: &dyn CommandExecutor,
        sink: &dyn ArtifactSink,
    ) -> Result<Vec<PathBuf>, StepError> {
        let artifacts = self.discover(build_type)?;
        copy_artifacts(executor, sink, self.printer, &artifacts)
    }
}

/// `app-<anything>-androidTest.apk`
pub fn instrumentation_apk_pattern() -> Result<Regex, StepError> {
    Ok(Regex::new(r"^app-.*-androidTest\.apk$")?)
}

/// `app-<variant>.apk`, e.g. `app-debug.apk`.
pub fn app_apk_pattern(build_type: BuildType) -> Result<Regex, StepError> {
    let pattern = format!(r"^app-{}\.apk$", regex::escape(build_type.as_str()));
    Ok(Regex::new(&pattern)?)
}
