//! Configuration file support for patrol-step.
//!
//! Settings that belong to the project rather than to a single pipeline run
//! live in `patrol-step.toml`, most importantly the compatibility table the
//! validate stage checks against.
//!
//! ## Configuration File Location
//!
//! 1. `--config <path>` or `PATROL_STEP_CONFIG`
//! 2. `./patrol-step.toml`, then parent directories up to the repository root
//!
//! ## Example Configuration
//!
//! ```toml
//! [project]
//! # Flutter project whose build outputs are exported
//! root = "app"
//!
//! [install]
//! # Used when CUSTOM_PATROL_CLI_VERSION is not set
//! patrol_cli_version = "3.9.0"
//!
//! [[compatibility.rules]]
//! flutter = ">=3.32.0"
//! patrol_cli = ">=3.9.0, <4.0.0"
//! patrol = ">=3.15.0"
//! ```

use anyhow::{Context, Result};
use patrol_step_sdk::CompatibilityTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default configuration file name.
pub const CONFIG_FILE_NAME: &str = "patrol-step.toml";

/// Root configuration structure for `patrol-step.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub project: ProjectConfig,

    pub install: InstallConfig,

    /// Accepted version combinations. Absent means no policy is enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<CompatibilityTable>,
}

/// Project-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Flutter project root, relative to the config file.
    ///
    /// Defaults to the working directory.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Patrol CLI version to activate. `CUSTOM_PATROL_CLI_VERSION` wins.
    pub patrol_cli_version: Option<String>,
}

impl StepConfig {
    /// Loads and validates configuration from `path`.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: StepConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        if let Some(table) = &config.compatibility {
            table
                .validate()
                .with_context(|| format!("Invalid config file: {:?}", path))?;
        }

        Ok(config)
    }

    /// Searches for `patrol-step.toml` from the current directory upwards.
    pub fn discover() -> Result<Option<(Self, PathBuf)>> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&cwd)
    }

    /// Searches for `patrol-step.toml` starting from `start_dir`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((config, path)))` - Found and loaded configuration with its path
    /// * `Ok(None)` - No configuration file found
    /// * `Err` - If a config file was found but couldn't be parsed
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let config = Self::load_from_file(&config_path)?;
                return Ok(Some((config, config_path)));
            }

            // Stop at repository root or filesystem root
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Loads `explicit` when given, otherwise discovers from the current
    /// directory. A missing explicit file is an error.
    pub fn resolve(explicit: Option<&Path>) -> Result<Option<(Self, PathBuf)>> {
        match explicit {
            Some(path) => Ok(Some((Self::load_from_file(path)?, path.to_path_buf()))),
            None => Self::discover(),
        }
    }

    /// Project root for exports, resolved against the config file location.
    pub fn project_root(&self, config_path: Option<&Path>, cwd: &Path) -> PathBuf {
        let base = config_path
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(cwd);
        match &self.project.root {
            Some(root) => base.join(root),
            None => cwd.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = StepConfig::default();
        assert!(config.compatibility.is_none());
        assert!(config.project.root.is_none());
        assert!(config.install.patrol_cli_version.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let toml_content = r#"
[project]
root = "app"

[install]
patrol_cli_version = "3.9.0"

[[compatibility.rules]]
flutter = ">=3.32.0"
patrol_cli = ">=3.9.0, <4.0.0"
patrol = ">=3.15.0"

[[compatibility.rules]]
patrol_cli = "^3.4"
"#;
        std::fs::write(&config_path, toml_content).unwrap();

        let config = StepConfig::load_from_file(&config_path).unwrap();
        assert_eq!(config.project.root, Some(PathBuf::from("app")));
        assert_eq!(config.install.patrol_cli_version.as_deref(), Some("3.9.0"));
        assert_eq!(config.compatibility.unwrap().rules.len(), 2);
    }

    #[test]
    fn test_empty_compatibility_section_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[compatibility]\n").unwrap();

        let err = StepConfig::load_from_file(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("declares no rules"));
    }

    #[test]
    fn test_invalid_requirement_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[[compatibility.rules]]\nflutter = \"not a req\"\n").unwrap();

        let err = StepConfig::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[install]\npatrol_cli_version = \"3.4.1\"\n").unwrap();
        let nested = temp_dir.path().join("app").join("integration_test");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, path) = StepConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.install.patrol_cli_version.as_deref(), Some("3.4.1"));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_no_config() {
        let temp_dir = TempDir::new().unwrap();
        // Create a .git directory to stop the search
        std::fs::create_dir(temp_dir.path().join(".git")).unwrap();

        let result = StepConfig::discover_from(temp_dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_resolve_explicit_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(StepConfig::resolve(Some(&missing)).is_err());
    }

    #[test]
    fn test_project_root_is_relative_to_config() {
        let mut config = StepConfig::default();
        let cwd = Path::new("/work");
        assert_eq!(config.project_root(None, cwd), PathBuf::from("/work"));

        config.project.root = Some(PathBuf::from("app"));
        assert_eq!(
            config.project_root(Some(Path::new("/repo/patrol-step.toml")), cwd),
            PathBuf::from("/repo/app")
        );
        assert_eq!(config.project_root(None, cwd), PathBuf::from("/work/app"));
    }
}
