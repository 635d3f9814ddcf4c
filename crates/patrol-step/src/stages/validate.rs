//! Validate stage: resolve the Flutter and `patrol` package versions and
//! check them, together with the CLI version, against the compatibility
//! policy.

use patrol_step_sdk::commands::{self, ExternalCommand};
use patrol_step_sdk::compat::check_compatibility;
use patrol_step_sdk::version::{extract_dependency_version, extract_prefixed_version};
use patrol_step_sdk::{
    CommandExecutor, CompatibilityRule, CompatibilityTable, Printer, SemanticVersion, StepError,
    Unrestricted, VersionSet,
};

pub const FLUTTER_VERSION_PREFIX: &str = "Flutter";
pub const PATROL_PACKAGE: &str = "patrol";

/// Flutter SDK version from `flutter --version`.
pub fn flutter_version(executor: &dyn CommandExecutor) -> Result<SemanticVersion, StepError> {
    let output = executor.run(&commands::flutter_version())?;
    extract_prefixed_version(&output, FLUTTER_VERSION_PREFIX)
}

/// `patrol` package version from the project's dependency listing.
///
/// Only `flutter pub deps --style=compact` prints the listing this parser
/// understands; any other command is rejected before it runs.
pub fn patrol_version(
    executor: &dyn CommandExecutor,
    command: &ExternalCommand,
) -> Result<SemanticVersion, StepError> {
    let expected = commands::flutter_pub_dependencies();
    if !commands::is_same_command(command, &expected) {
        return Err(StepError::NotFound(format!(
            "dependency listing: `{}` is not `{}`",
            command, expected
        )));
    }
    let output = executor.run(command)?;
    extract_dependency_version(&output, PATROL_PACKAGE)
}

/// Resolves the remaining versions and applies `table`, or no policy at all
/// when `table` is `None`.
pub fn run(
    executor: &dyn CommandExecutor,
    printer: Printer,
    cli_version: SemanticVersion,
    table: Option<&CompatibilityTable>,
) -> Result<VersionSet, StepError> {
    printer.step_initiated("--- Getting Flutter Version ---");
    let flutter = flutter_version(executor).inspect_err(|err| {
        printer.warning("❌ Failed to get Flutter version");
        printer.error(&err.to_string());
    })?;
    printer.step_completed(&format!("✅ Flutter Version: {}\n", flutter));

    printer.step_initiated("--- Getting Patrol Version ---");
    let patrol = patrol_version(executor, &commands::flutter_pub_dependencies()).inspect_err(
        |err| {
            printer.warning("❌ Failed to get Patrol version");
            printer.error(&err.to_string());
        },
    )?;
    printer.step_completed(&format!("✅ Patrol Version: {}\n", patrol));

    let versions = VersionSet {
        flutter,
        patrol_cli: cli_version,
        patrol,
    };

    printer.step_initiated("--- Checking Compatibility ---");
    let rule: &dyn CompatibilityRule = match table {
        Some(table) => table,
        None => {
            printer.warning("No compatibility table configured; skipping the version policy");
            &Unrestricted
        }
    };
    tracing::debug!(policy = %rule.describe(), "checking compatibility");

    if check_compatibility(rule, &versions) {
        printer.step_completed(&format!(
            "✅ Flutter {}, Patrol CLI {} and Patrol {} are compatible",
            versions.flutter, versions.patrol_cli, versions.patrol
        ));
        return Ok(versions);
    }

    let err = StepError::IncompatibleVersions {
        flutter: versions.flutter,
        patrol_cli: versions.patrol_cli,
        patrol: versions.patrol,
    };
    printer.error(&format!("❌ {}", err));
    Err(err)
}
