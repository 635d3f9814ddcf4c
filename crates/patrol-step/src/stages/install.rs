//! Install stage: make sure a Patrol CLI is available and learn its version.

use patrol_step_sdk::commands;
use patrol_step_sdk::version::extract_prefixed_version;
use patrol_step_sdk::{CommandExecutor, Printer, SemanticVersion, StepError};

/// Banner prefix of the version line in `patrol doctor --verbose`.
pub const CLI_VERSION_PREFIX: &str = "Patrol CLI Version";

/// Version reported by the installed Patrol CLI.
pub fn cli_version(executor: &dyn CommandExecutor) -> Result<SemanticVersion, StepError> {
    let output = executor.run(&commands::patrol_doctor())?;
    extract_prefixed_version(&output, CLI_VERSION_PREFIX)
}

/// Activates `patrol_cli` globally, optionally pinned to `version`.
pub fn install_cli(executor: &dyn CommandExecutor, version: Option<&str>) -> Result<(), StepError> {
    executor.run(&commands::patrol_install(version)).map(|_| ())
}

/// Returns the installed CLI version, installing the CLI first if needed.
///
/// The version is re-read exactly once after an install.
pub fn run(
    executor: &dyn CommandExecutor,
    printer: Printer,
    custom_version: Option<&str>,
) -> Result<SemanticVersion, StepError> {
    printer.step_initiated("--- Checking if Patrol CLI is already installed ---");

    match cli_version(executor) {
        Ok(version) => {
            printer.step_completed(&format!("✅ Tool already installed. Version: {}\n", version));
            Ok(version)
        }
        Err(err) => {
            tracing::info!(error = %err, "patrol CLI not usable, installing");
            printer.warning("CLI is not installed, attempting installation...");

            if let Err(err) = install_cli(executor, custom_version) {
                printer.error(&format!("❌ Installation failed: {}", err));
                return Err(err);
            }

            match cli_version(executor) {
                Ok(version) => {
                    printer.step_completed(&format!(
                        "✅ PATROL CLI installed successfully. Version: {}\n",
                        version
                    ));
                    Ok(version)
                }
                Err(err) => {
                    printer.error(&format!("❌ Failed to verify version after install: {}", err));
                    Err(err)
                }
            }
        }
    }
}
