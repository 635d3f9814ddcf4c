//! Translation of the step's environment into `patrol build` command lines.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use patrol_step_sdk::BuildConfiguration;
//!
//! let mapping = HashMap::from([
//!     ("platform".to_string(), "both".to_string()),
//!     ("target".to_string(), "integration_test/app_test.dart".to_string()),
//!     ("buildType".to_string(), "release".to_string()),
//!     ("tags".to_string(), "smoke, login".to_string()),
//! ]);
//!
//! let config = BuildConfiguration::from_map(&mapping)?;
//! let lines = config.command_lines();
//! assert_eq!(lines.len(), 2);
//! assert!(lines[0].starts_with("patrol build android"));
//! assert!(lines[1].contains("--tags '( smoke && login )'"));
//! # Ok::<(), patrol_step_sdk::ConfigError>(())
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::commands::ExternalCommand;
use crate::keys::{self, fields};
use crate::types::{BuildType, ConfigError, Platform};

const VERBOSE_FLAG: &str = "--verbose";
const COVERAGE_FLAG: &str = "--covered";
const SIMULATOR_FLAG: &str = "--simulator";

/// Validated build parameters.
///
/// Only [`BuildConfiguration::from_map`] creates values, and every field goes
/// through its setter, so an instance is always fully valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    platform: Platform,
    target: String,
    build_type: BuildType,
    tags: Option<String>,
    excluded_tags: Option<String>,
    verbose: bool,
    coverage: bool,
}

impl BuildConfiguration {
    /// Builds the configuration from a flat mapping keyed by [`fields`] names.
    ///
    /// Required fields (`platform`, `target`, `buildType`) must be present and
    /// non-blank. Optional fields are applied only when non-blank.
    pub fn from_map(mapping: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            mapping
                .get(key)
                .map(String::as_str)
                .filter(|v| !v.trim().is_empty())
        };

        let required = |key: &str| {
            value(key).ok_or_else(|| ConfigError::MissingRequiredField(key.to_string()))
        };

        let platform = required(fields::PLATFORM)?;
        let target = required(fields::TARGET)?;
        let build_type = required(fields::BUILD_TYPE)?;

        let mut config = Self {
            platform: platform.parse()?,
            target: String::new(),
            build_type: build_type.parse()?,
            tags: None,
            excluded_tags: None,
            verbose: false,
            coverage: false,
        };
        config.set_target(target)?;

        if let Some(tags) = value(fields::TAGS) {
            config.set_tags(tags);
        }
        if let Some(tags) = value(fields::EXCLUDED_TAGS) {
            config.set_excluded_tags(tags);
        }
        if let Some(flag) = value(fields::VERBOSE) {
            config.set_verbose(flag)?;
        }
        if let Some(flag) = value(fields::COVERAGE) {
            config.set_coverage(flag)?;
        }

        Ok(config)
    }

    /// Reads the mapping from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_map(&env_mapping(|var| std::env::var(var).ok()))
    }

    pub fn set_platform(&mut self, value: &str) -> Result<(), ConfigError> {
        self.platform = value.parse()?;
        Ok(())
    }

    pub fn set_target(&mut self, value: &str) -> Result<(), ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingRequiredField(fields::TARGET.to_string()));
        }
        self.target = trimmed.to_string();
        Ok(())
    }

    pub fn set_build_type(&mut self, value: &str) -> Result<(), ConfigError> {
        self.build_type = value.parse()?;
        Ok(())
    }

    pub fn set_tags(&mut self, value: &str) {
        self.tags = format_tags(value);
    }

    pub fn set_excluded_tags(&mut self, value: &str) {
        self.excluded_tags = format_tags(value);
    }

    pub fn set_verbose(&mut self, value: &str) -> Result<(), ConfigError> {
        self.verbose = parse_flag(fields::VERBOSE, value)?;
        Ok(())
    }

    pub fn set_coverage(&mut self, value: &str) -> Result<(), ConfigError> {
        self.coverage = parse_flag(fields::COVERAGE, value)?;
        Ok(())
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    pub fn excluded_tags(&self) -> Option<&str> {
        self.excluded_tags.as_deref()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn coverage(&self) -> bool {
        self.coverage
    }

    /// The normalized required fields, keyed like the input mapping.
    pub fn required_fields(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            (fields::PLATFORM, self.platform.as_str().to_string()),
            (fields::TARGET, self.target.clone()),
            (fields::BUILD_TYPE, self.build_type.as_str().to_string()),
        ])
    }

    /// Flags shared by every platform line, in command-line order.
    fn shared_args(&self) -> Vec<String> {
        let mut args = vec!["--target".to_string(), self.target.clone()];
        if let Some(tags) = &self.tags {
            args.push("--tags".to_string());
            args.push(tags.clone());
        }
        if let Some(tags) = &self.excluded_tags {
            args.push("--excludedTags".to_string());
            args.push(tags.clone());
        }
        if self.verbose {
            args.push(VERBOSE_FLAG.to_string());
        }
        if self.coverage {
            args.push(COVERAGE_FLAG.to_string());
        }
        args
    }

    /// The `patrol build` line for a single platform.
    fn command_line(&self, platform: Platform) -> String {
        let mut parts = vec![
            "patrol".to_string(),
            "build".to_string(),
            platform.as_str().to_string(),
        ];
        parts.extend(self.shared_args());
        parts.push(self.build_type.flag().to_string());
        // A debug iOS build can only run on the simulator.
        if platform == Platform::Ios && self.build_type == BuildType::Debug {
            parts.push(SIMULATOR_FLAG.to_string());
        }
        parts.join(" ")
    }

    /// One shell line per requested platform; `both` yields android then ios.
    pub fn command_lines(&self) -> Vec<String> {
        match self.platform {
            Platform::Both => vec![
                self.command_line(Platform::Android),
                self.command_line(Platform::Ios),
            ],
            single => vec![self.command_line(single)],
        }
    }

    /// [`command_lines`](Self::command_lines) wrapped for `sh -c`, so tag
    /// expressions keep their quoting.
    pub fn build_commands(&self) -> Vec<ExternalCommand> {
        self.command_lines()
            .into_iter()
            .map(ExternalCommand::shell)
            .collect()
    }
}

/// Collects the mapping expected by [`BuildConfiguration::from_map`] using
/// `lookup` to read each environment variable.
pub fn env_mapping(lookup: impl Fn(&str) -> Option<String>) -> HashMap<String, String> {
    keys::FIELD_ENV_VARS
        .iter()
        .filter_map(|(field, var)| lookup(var).map(|value| (field.to_string(), value)))
        .collect()
}

/// Converts `a, b` into the tag expression `'( a && b )'`.
///
/// Returns `None` when no non-blank tag remains.
pub fn format_tags(input: &str) -> Option<String> {
    let tags: Vec<&str> = input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        return None;
    }
    Some(format!("'( {} )'", tags.join(" && ")))
}

fn parse_flag(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidFlagValue {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}
