//! Artifact export for Android and iOS Patrol builds.
//!
//! After `patrol build` the outputs are scattered across Flutter's build tree.
//! The exporters locate them, copy them into a fixed layout and publish one
//! key per artifact for later pipeline steps.
//!
//! | Exporter | Searches | Copies into | Keys |
//! |----------|----------|-------------|------|
//! | [`AndroidExporter`] | `build/app/outputs/apk/...` | `patrol/android` | `ANDROID_APK_PATH`, `ANDROID_INSTRUMENTATION_APK_PATH` |
//! | [`IosExporter`] | `build/ios_integ/Build/Products` | `patrol/ios` | `IOS_APP_UNDER_TEST`, `IOS_TEST_INSTRUMENTATION_APP`, `IOS_RUNNER_FILE`, `IOS_BUILD_EXPORTS` |
//!
//! Copies, directory creation and archiving are performed by spawning `cp`,
//! `mkdir` and `zip` through the injected
//! [`CommandExecutor`](crate::executor::CommandExecutor).

use std::path::{Path, PathBuf};

use crate::commands;
use crate::executor::CommandExecutor;
use crate::print::Printer;
use crate::types::{BuildType, Platform, StepError};

pub mod android;
pub mod common;
pub mod ios;

pub use android::AndroidExporter;
pub use ios::{IosArtifacts, IosExporter};

/// Receives one (key, absolute path) pair per exported artifact.
pub trait ArtifactSink {
    fn export(&self, key: &str, path: &Path) -> Result<(), StepError>;
}

/// Publishes keys with `envman add`, the Bitrise environment manager.
pub struct EnvmanSink<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> EnvmanSink<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }
}

impl ArtifactSink for EnvmanSink<'_> {
    fn export(&self, key: &str, path: &Path) -> Result<(), StepError> {
        let value = path.to_string_lossy();
        self.executor
            .run(&commands::envman_add(key, &value))
            .map(|_| ())
    }
}

/// Runs the Android export, then the iOS export, for whatever `platform`
/// selects. An Android failure stops the iOS export.
///
/// Returns the exported destination paths in export order.
pub fn export_artifacts(
    project_root: &Path,
    platform: Platform,
    build_type: BuildType,
    executor: &dyn CommandExecutor,
    sink: &dyn ArtifactSink,
    printer: Printer,
) -> Result<Vec<PathBuf>, StepError> {
    let mut exported = Vec::new();

    if platform.includes_android() {
        let android = AndroidExporter::new(project_root).printer(printer);
        exported.extend(android.export(build_type, executor, sink)?);
    } else {
        printer.action("No Android builds were selected to build");
    }

    if platform.includes_ios() {
        let ios = IosExporter::new(project_root).printer(printer);
        exported.extend(ios.export(build_type, executor, sink)?);
    } else {
        printer.action("No iOS builds were selected to build");
    }

    Ok(exported)
}
