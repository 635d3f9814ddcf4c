//! iOS artifact export
//!
//! `patrol build ios` leaves its products under
//! `build/ios_integ/Build/Products`:
//!
//! ```text
//! Products/
//! ├── Debug-iphonesimulator/          (debug builds)
//! │   ├── Runner.app
//! │   └── RunnerUITests-Runner.app
//! ├── Release-iphoneos/               (release builds)
//! └── Runner_*.xctestrun
//! ```
//!
//! The exporter copies the two apps and the first xctestrun file into
//! `patrol/ios`, then zips the build directory together with every xctestrun
//! file into `ios_tests.zip` and exports that as well.

use std::path::{Path, PathBuf};

use super::ArtifactSink;
use super::common::{copy_artifacts, find_with_extension, zip_files};
use crate::executor::CommandExecutor;
use crate::keys::exports;
use crate::print::Printer;
use crate::types::{ArtifactDescriptor, BuildType, ConfigError, StepError};

pub const BUILD_PRODUCTS_DIR: &str = "build/ios_integ/Build/Products";
pub const IOS_ARTIFACTS_DIR: &str = "patrol/ios";
pub const RELEASE_BUILD_DIR: &str = "Release-iphoneos";
pub const DEBUG_BUILD_DIR: &str = "Debug-iphonesimulator";
/// Present only when a release build was made for the simulator.
pub const RELEASE_SIMULATOR_BUILD_DIR: &str = "Release-iphonesimulator";
pub const APP_UNDER_TEST: &str = "Runner.app";
pub const TEST_INSTRUMENTATION_APP: &str = "RunnerUITests-Runner.app";
pub const XCTESTRUN_EXTENSION: &str = "xctestrun";
pub const EXPORTS_ZIP_NAME: &str = "ios_tests.zip";

/// Build outputs located for one iOS export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IosArtifacts {
    pub build_dir: PathBuf,
    pub app_under_test: PathBuf,
    pub test_instrumentation: PathBuf,
    /// Sorted; the first entry is the one exported as `IOS_RUNNER_FILE`.
    pub xctestruns: Vec<PathBuf>,
}

impl IosArtifacts {
    pub fn selected_xctestrun(&self) -> &Path {
        // discover() never returns an empty list
        &self.xctestruns[0]
    }

    /// Inputs of the `ios_tests.zip` archive, relative to `project_root` so
    /// the archive entries start at `build/ios_integ/...`.
    pub fn zip_inputs(&self, project_root: &Path) -> Vec<PathBuf> {
        std::iter::once(&self.build_dir)
            .chain(&self.xctestruns)
            .map(|path| relative_to(path, project_root))
            .collect()
    }
}

/// Locates and exports iOS test bundles.
pub struct IosExporter {
    project_root: PathBuf,
    printer: Printer,
}

impl IosExporter {
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

    pub fn products_dir(&self) -> PathBuf {
        self.project_root.join(BUILD_PRODUCTS_DIR)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.project_root.join(IOS_ARTIFACTS_DIR)
    }

    /// Picks the products subdirectory for `build_type`.
    ///
    /// Release builds must target a device, so a `Release-iphonesimulator`
    /// directory means the build flags were wrong. Debug builds must have
    /// produced `Debug-iphonesimulator`.
    pub fn resolve_build_dir(&self, build_type: BuildType) -> Result<PathBuf, StepError> {
        let products = self.products_dir();
        match build_type {
            BuildType::Release => {
                if products.join(RELEASE_SIMULATOR_BUILD_DIR).exists() {
                    return Err(ConfigError::InvalidBuildFlags(format!(
                        "found {RELEASE_SIMULATOR_BUILD_DIR} for a release build"
                    ))
                    .into());
                }
                Ok(products.join(RELEASE_BUILD_DIR))
            }
            BuildType::Debug => {
                let dir = products.join(DEBUG_BUILD_DIR);
                if !dir.exists() {
                    return Err(ConfigError::InvalidBuildFlags(format!(
                        "{DEBUG_BUILD_DIR} not found for a debug build"
                    ))
                    .into());
                }
                Ok(dir)
            }
        }
    }

    /// Locates the apps and xctestrun files without touching anything.
    pub fn discover(&self, build_type: BuildType) -> Result<IosArtifacts, StepError> {
        let build_dir = self.resolve_build_dir(build_type)?;
        let app_under_test = required_app(&build_dir, APP_UNDER_TEST)?;
        let test_instrumentation = required_app(&build_dir, TEST_INSTRUMENTATION_APP)?;

        let products = self.products_dir();
        let xctestruns = find_with_extension(&products, XCTESTRUN_EXTENSION)?;
        if xctestruns.is_empty() {
            return Err(StepError::NotFound(format!(
                "xctestrun file in {}",
                products.display()
            )));
        }

        tracing::debug!(
            build_dir = %build_dir.display(),
            xctestruns = xctestruns.len(),
            "discovered iOS build outputs"
        );
        Ok(IosArtifacts {
            build_dir,
            app_under_test,
            test_instrumentation,
            xctestruns,
        })
    }

    /// Copies the apps and runner file, then archives and exports the
    /// products.
    ///
    /// The archive is created with paths relative to the project root, so
    /// `executor` must run commands from there.
    pub fn export(
        &self,
        build_type: BuildType,
        executor: &dyn CommandExecutor,
        sink: &dyn ArtifactSink,
    ) -> Result<Vec<PathBuf>, StepError> {
        let found = self.discover(build_type)?;
        let destination = self.artifacts_dir();

        let artifacts = [
            ArtifactDescriptor::new(
                &found.app_under_test,
                &destination,
                Some(exports::IOS_APP_UNDER_TEST),
            ),
            ArtifactDescriptor::new(
                &found.test_instrumentation,
                &destination,
                Some(exports::IOS_TEST_INSTRUMENTATION_APP),
            ),
            ArtifactDescriptor::new(
                found.selected_xctestrun(),
                &destination,
                Some(exports::IOS_RUNNER_FILE),
            ),
        ];
        let mut exported = copy_artifacts(executor, sink, self.printer, &artifacts)?;

        // zip runs from the project root with relative paths
        let archive = Path::new(BUILD_PRODUCTS_DIR).join(EXPORTS_ZIP_NAME);
        zip_files(executor, &archive, &found.zip_inputs(&self.project_root))?;
        exported.extend(copy_artifacts(
            executor,
            sink,
            self.printer,
            &[ArtifactDescriptor::new(
                self.products_dir().join(EXPORTS_ZIP_NAME),
                &destination,
                Some(exports::IOS_BUILD_EXPORTS),
            )],
        )?);
        Ok(exported)
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn required_app(build_dir: &Path, name: &str) -> Result<PathBuf, StepError> {
    let path = build_dir.join(name);
    if !path.exists() {
        return Err(StepError::NotFound(format!(
            "iOS artifact {name} in {}",
            build_dir.display()
        )));
    }
    if !path.is_dir() {
        return Err(StepError::NotFound(format!(
            "expected {} to be an app bundle directory",
            path.display()
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands;
    use crate::fakes::{RecordingSink, ScriptedExecutor};
    use std::fs;

    fn products_tree(root: &Path, build_dir: &str) -> PathBuf {
        let products = root.join(BUILD_PRODUCTS_DIR);
        fs::create_dir_all(products.join(build_dir).join(APP_UNDER_TEST)).unwrap();
        fs::create_dir_all(products.join(build_dir).join(TEST_INSTRUMENTATION_APP)).unwrap();
        fs::write(
            products.join("Runner_iphonesimulator17.0-arm64.xctestrun"),
            b"<plist/>",
        )
        .unwrap();
        fs::write(products.join("Runner_iphoneos17.0-arm64.xctestrun"), b"<plist/>").unwrap();
        products
    }

    #[test]
    fn test_debug_export_copies_apps_runner_and_zip() {
        let dir = tempfile::tempdir().unwrap();
        let products = products_tree(dir.path(), DEBUG_BUILD_DIR);
        let executor = ScriptedExecutor::new();
        let sink = RecordingSink::new();

        let exported = IosExporter::new(dir.path())
            .export(BuildType::Debug, &executor, &sink)
            .unwrap();

        let dest = dir.path().join(IOS_ARTIFACTS_DIR);
        assert_eq!(
            exported,
            vec![
                dest.join(APP_UNDER_TEST),
                dest.join(TEST_INSTRUMENTATION_APP),
                dest.join("Runner_iphoneos17.0-arm64.xctestrun"),
                dest.join(EXPORTS_ZIP_NAME),
            ]
        );
        assert_eq!(
            sink.get(exports::IOS_RUNNER_FILE),
            Some(dest.join("Runner_iphoneos17.0-arm64.xctestrun"))
        );
        assert_eq!(
            sink.get(exports::IOS_BUILD_EXPORTS),
            Some(dest.join(EXPORTS_ZIP_NAME))
        );

        let zip = executor.calls_to("zip");
        assert_eq!(zip.len(), 1);
        assert_eq!(
            zip[0].args(),
            [
                "-r",
                "build/ios_integ/Build/Products/ios_tests.zip",
                "build/ios_integ/Build/Products/Debug-iphonesimulator",
                "build/ios_integ/Build/Products/Runner_iphoneos17.0-arm64.xctestrun",
                "build/ios_integ/Build/Products/Runner_iphonesimulator17.0-arm64.xctestrun",
            ]
        );
        let copy_archive = commands::copy_to(
            &products.join(EXPORTS_ZIP_NAME),
            &dest.join(EXPORTS_ZIP_NAME),
        );
        assert_eq!(executor.call_count(&copy_archive), 1);
    }

    #[test]
    fn test_debug_without_simulator_dir_is_invalid_flags() {
        let dir = tempfile::tempdir().unwrap();
        products_tree(dir.path(), "Debug-iphoneos");
        let executor = ScriptedExecutor::new();
        let sink = RecordingSink::new();

        let err = IosExporter::new(dir.path())
            .export(BuildType::Debug, &executor, &sink)
            .unwrap_err();

        assert!(matches!(
            err,
            StepError::InvalidConfiguration(ConfigError::InvalidBuildFlags(_))
        ));
        assert!(executor.calls().is_empty());
        assert!(sink.exports().is_empty());
    }

    #[test]
    fn test_release_with_simulator_dir_is_invalid_flags() {
        let dir = tempfile::tempdir().unwrap();
        products_tree(dir.path(), RELEASE_BUILD_DIR);
        fs::create_dir_all(dir.path().join(BUILD_PRODUCTS_DIR).join(RELEASE_SIMULATOR_BUILD_DIR))
            .unwrap();

        let err = IosExporter::new(dir.path())
            .resolve_build_dir(BuildType::Release)
            .unwrap_err();
        assert!(matches!(
            err,
            StepError::InvalidConfiguration(ConfigError::InvalidBuildFlags(_))
        ));
    }

    #[test]
    fn test_release_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let products = products_tree(dir.path(), RELEASE_BUILD_DIR);

        let found = IosExporter::new(dir.path())
            .discover(BuildType::Release)
            .unwrap();
        assert_eq!(found.build_dir, products.join(RELEASE_BUILD_DIR));
        assert_eq!(found.xctestruns.len(), 2);
        assert_eq!(
            found.zip_inputs(dir.path())[0],
            Path::new(BUILD_PRODUCTS_DIR).join(RELEASE_BUILD_DIR)
        );
    }

    #[test]
    fn test_app_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let products = dir.path().join(BUILD_PRODUCTS_DIR);
        let build_dir = products.join(DEBUG_BUILD_DIR);
        fs::create_dir_all(&build_dir).unwrap();
        fs::write(build_dir.join(APP_UNDER_TEST), b"not a bundle").unwrap();

        let err = IosExporter::new(dir.path())
            .discover(BuildType::Debug)
            .unwrap_err();
        assert!(err.to_string().contains("app bundle directory"));
    }

    #[test]
    fn test_missing_xctestrun_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let build_dir = dir.path().join(BUILD_PRODUCTS_DIR).join(DEBUG_BUILD_DIR);
        fs::create_dir_all(build_dir.join(APP_UNDER_TEST)).unwrap();
        fs::create_dir_all(build_dir.join(TEST_INSTRUMENTATION_APP)).unwrap();

        let err = IosExporter::new(dir.path())
            .discover(BuildType::Debug)
            .unwrap_err();
        assert!(matches!(err, StepError::NotFound(ref what) if what.contains("xctestrun")));
    }
}
