//! Build stage: run one `patrol build` per requested platform.

use patrol_step_sdk::{BuildConfiguration, CommandExecutor, Printer, StepError};

/// Streams every build command in order and stops at the first failure.
pub fn run(
    executor: &dyn CommandExecutor,
    printer: Printer,
    config: &BuildConfiguration,
) -> Result<(), StepError> {
    printer.step_initiated("--- Starting Build Process ---");

    for (line, command) in config.command_lines().iter().zip(config.build_commands()) {
        printer.action(&format!("Executing build command: {}", line));
        if let Err(err) = executor.stream(&command) {
            printer.error(&format!("❌ Command failed: {}\n", err));
            return Err(err);
        }
        printer.success(&format!("✅ Command '{}' executed successfully.\n", line));
    }

    printer.step_completed("✅ All build commands executed successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use patrol_step_sdk::ExternalCommand;
    use patrol_step_sdk::fakes::ScriptedExecutor;
    use std::collections::HashMap;

    fn config(platform: &str, build_type: &str) -> BuildConfiguration {
        let mapping = HashMap::from([
            ("platform".to_string(), platform.to_string()),
            ("target".to_string(), "integration_test/login_test.dart".to_string()),
            ("buildType".to_string(), build_type.to_string()),
        ]);
        BuildConfiguration::from_map(&mapping).unwrap()
    }

    #[test]
    fn both_platforms_stream_android_then_ios() {
        let executor = ScriptedExecutor::new();
        run(&executor, Printer::plain(), &config("both", "debug")).unwrap();

        assert_eq!(
            executor.streamed(),
            vec![
                ExternalCommand::shell(
                    "patrol build android --target integration_test/login_test.dart --debug"
                ),
                ExternalCommand::shell(
                    "patrol build ios --target integration_test/login_test.dart --debug --simulator"
                ),
            ]
        );
    }

    #[test]
    fn android_failure_skips_ios_build() {
        let android = ExternalCommand::shell(
            "patrol build android --target integration_test/login_test.dart --release",
        );
        let executor = ScriptedExecutor::new().fail(android.clone(), "Gradle task assembleRelease failed");

        let err = run(&executor, Printer::plain(), &config("both", "release")).unwrap_err();
        assert!(err.to_string().contains("assembleRelease"));
        assert_eq!(executor.streamed(), vec![android]);
    }
}
