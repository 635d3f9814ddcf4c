//! Patrol Step SDK
//!
//! `patrol-step-sdk` holds the logic behind a CI step that prepares Flutter
//! [Patrol](https://patrol.leancode.co) UI tests for device farms: it checks
//! that the Flutter SDK, the Patrol CLI and the `patrol` package are
//! compatible, turns step inputs into `patrol build` invocations, and exports
//! the resulting Android APKs and iOS bundles for later steps.
//!
//! # Quick Start
//!
//! ```no_run
//! use patrol_step_sdk::{BuildConfiguration, ProcessExecutor, CommandExecutor};
//!
//! fn main() -> Result<(), patrol_step_sdk::StepError> {
//!     let config = BuildConfiguration::from_env()?;
//!     let executor = ProcessExecutor::new();
//!     for command in config.build_commands() {
//!         executor.stream(&command)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **version**: Extracts semantic versions from tool output
//! - **compat**: Decides whether a version triple may be used together
//! - **build_params**: Validated build inputs and the command lines they produce
//! - **commands** / **executor**: External tool invocations and how they run
//! - **exporters**: Locates build outputs, copies them and publishes their paths
//!
//! Every external tool goes through the [`CommandExecutor`] trait so the whole
//! step can be driven by [`fakes::ScriptedExecutor`] in tests.

// Public modules
pub mod build_params;
pub mod commands;
pub mod compat;
pub mod executor;
pub mod exporters;
pub mod fakes;
pub mod keys;
pub mod print;
pub mod types;
pub mod version;

// Re-export key types for convenience
pub use build_params::BuildConfiguration;
pub use commands::ExternalCommand;
pub use compat::{CompatibilityRule, CompatibilityTable, Unrestricted, VersionSet};
pub use executor::{CommandExecutor, ProcessExecutor};
pub use exporters::{ArtifactSink, EnvmanSink, export_artifacts};
pub use print::Printer;
pub use types::{ArtifactDescriptor, BuildType, ConfigError, Platform, StepError};
pub use version::SemanticVersion;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
