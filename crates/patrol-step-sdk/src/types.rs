//! Core types for patrol-step-sdk.
//!
//! This module defines the fundamental types used throughout the SDK:
//!
//! - [`StepError`] / [`ConfigError`] - Error types for every stage of the step
//! - [`Platform`] - Platform selection (Android, iOS, or both)
//! - [`BuildType`] - Release or debug (simulator) builds
//! - [`ArtifactDescriptor`] - A discovered build output waiting to be exported

use std::path::PathBuf;

use crate::version::SemanticVersion;

/// Error types for patrol-step-sdk operations.
///
/// Every stage-local function returns one of these instead of silently
/// defaulting. The pipeline driver only logs them.
///
/// # Example
///
/// ```
/// use patrol_step_sdk::version::extract_dependency_version;
/// use patrol_step_sdk::StepError;
///
/// match extract_dependency_version("- animations 2.1.0 [flutter]", "patrol") {
///     Err(StepError::NotFound(what)) => assert!(what.contains("patrol")),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Expected text or file is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Text was found but does not parse as a three-component semantic version.
    #[error("invalid semantic version '{input}': {source}")]
    MalformedVersion {
        input: String,
        #[source]
        source: semver::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// A spawned tool exited unsuccessfully.
    ///
    /// The captured output is kept so the literal tool diagnostic is not lost.
    #[error("`{command}` failed ({status})\n{output}")]
    ExternalCommandFailure {
        command: String,
        status: String,
        output: String,
    },

    /// A tool could not be started at all.
    #[error("failed to start `{command}`: {source}. Ensure the tool is installed and available on PATH")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// All three versions resolved but no compatibility rule accepts them.
    #[error("Flutter {flutter}, Patrol CLI {patrol_cli} and Patrol {patrol} are not compatible")]
    IncompatibleVersions {
        flutter: SemanticVersion,
        patrol_cli: SemanticVersion,
        patrol: SemanticVersion,
    },

    /// A file or version pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// An I/O error occurred while scanning build outputs.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StepError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration errors raised while validating environment input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("invalid platform '{0}': expected 'android', 'ios' or 'both'")]
    InvalidPlatform(String),

    #[error("invalid build type '{0}': expected 'release', 'debug' or 'simulator'")]
    InvalidBuildType(String),

    #[error("invalid value '{value}' for {field}: expected 'true' or 'false'")]
    InvalidFlagValue { field: String, value: String },

    /// The build outputs on disk contradict the requested build type.
    #[error("invalid iOS build flags: {0}")]
    InvalidBuildFlags(String),

    #[error("compatibility table: {0}")]
    CompatibilityTable(String),
}

/// Target platform for the Patrol build.
///
/// # Example
///
/// ```
/// use patrol_step_sdk::Platform;
///
/// let platform: Platform = "iOS".parse().unwrap();
/// assert_eq!(platform, Platform::Ios);
/// assert_eq!(Platform::Both.as_str(), "both");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Both,
}

impl Platform {
    /// Returns the lowercase name used on the command line and in the environment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Both => "both",
        }
    }

    /// Whether Android outputs are expected for this selection.
    pub fn includes_android(&self) -> bool {
        matches!(self, Platform::Android | Platform::Both)
    }

    /// Whether iOS outputs are expected for this selection.
    pub fn includes_ios(&self) -> bool {
        matches!(self, Platform::Ios | Platform::Both)
    }
}

impl std::str::FromStr for Platform {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "both" => Ok(Platform::Both),
            _ => Err(ConfigError::InvalidPlatform(value.to_string())),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build type passed to `patrol build`.
///
/// `simulator` is accepted as an alias of [`BuildType::Debug`]: a debug iOS
/// build always targets the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    Release,
    Debug,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Release => "release",
            BuildType::Debug => "debug",
        }
    }

    /// The `patrol build` flag for this build type.
    pub fn flag(&self) -> &'static str {
        match self {
            BuildType::Release => "--release",
            BuildType::Debug => "--debug",
        }
    }
}

impl std::str::FromStr for BuildType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "release" => Ok(BuildType::Release),
            "debug" | "simulator" => Ok(BuildType::Debug),
            _ => Err(ConfigError::InvalidBuildType(value.to_string())),
        }
    }
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered build output, consumed immediately by the export step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// File or bundle directory produced by the build.
    pub source: PathBuf,
    /// Folder the artifact is copied into.
    pub destination_folder: PathBuf,
    /// Key published to downstream steps, if any.
    pub export_key: Option<&'static str>,
}

impl ArtifactDescriptor {
    pub fn new(
        source: impl Into<PathBuf>,
        destination_folder: impl Into<PathBuf>,
        export_key: Option<&'static str>,
    ) -> Self {
        Self {
            source: source.into(),
            destination_folder: destination_folder.into(),
            export_key,
        }
    }

    /// Path the artifact will have once copied.
    pub fn destination(&self) -> PathBuf {
        match self.source.file_name() {
            Some(name) => self.destination_folder.join(name),
            None => self.destination_folder.clone(),
        }
    }
}
