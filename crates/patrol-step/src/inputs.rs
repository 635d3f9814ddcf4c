//! Step inputs read from the CI environment.

use std::collections::HashMap;

use patrol_step_sdk::build_params::env_mapping;
use patrol_step_sdk::keys;
use patrol_step_sdk::{BuildConfiguration, ConfigError};

/// Raw values of the step's input variables.
///
/// Build parameters stay unparsed until the build stage needs them, so a bad
/// `PLATFORM` does not prevent the install and validate stages from running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepInputs {
    /// Build parameters keyed by logical field name.
    pub build: HashMap<String, String>,
    pub custom_cli_version: Option<String>,
}

impl StepInputs {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            build: env_mapping(&lookup),
            custom_cli_version: lookup(keys::CUSTOM_PATROL_CLI_VERSION)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    /// Falls back to `version` when no custom CLI version was given.
    pub fn with_default_cli_version(mut self, version: Option<&str>) -> Self {
        if self.custom_cli_version.is_none() {
            self.custom_cli_version = version
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
        }
        self
    }

    pub fn build_configuration(&self) -> Result<BuildConfiguration, ConfigError> {
        BuildConfiguration::from_map(&self.build)
    }
}
