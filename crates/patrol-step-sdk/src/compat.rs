//! Compatibility checks between Flutter, the Patrol CLI and the `patrol` package.
//!
//! The rule set is a policy input. A [`CompatibilityTable`] is usually read from
//! the `[compatibility]` section of the step configuration file:
//!
//! ```toml
//! [[compatibility.rules]]
//! flutter = ">=3.32.0"
//! patrol_cli = ">=3.9.0, <4.0.0"
//! patrol = ">=3.15.0"
//! ```
//!
//! A set of versions is compatible when at least one rule accepts all three.

use serde::{Deserialize, Serialize};
use semver::VersionReq;

use crate::types::ConfigError;
use crate::version::SemanticVersion;

/// The three versions resolved by the install and validate stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSet {
    pub flutter: SemanticVersion,
    pub patrol_cli: SemanticVersion,
    pub patrol: SemanticVersion,
}

/// A compatibility policy. Implementations must be free of side effects.
pub trait CompatibilityRule {
    fn is_compatible(&self, versions: &VersionSet) -> bool;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Policy used when no table has been configured: everything passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl CompatibilityRule for Unrestricted {
    fn is_compatible(&self, _versions: &VersionSet) -> bool {
        true
    }

    fn describe(&self) -> String {
        "no compatibility table configured".to_string()
    }
}

/// One row of the table. A missing requirement accepts any version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    #[serde(default = "any_version")]
    pub flutter: VersionReq,
    #[serde(default = "any_version")]
    pub patrol_cli: VersionReq,
    #[serde(default = "any_version")]
    pub patrol: VersionReq,
}

fn any_version() -> VersionReq {
    VersionReq::STAR
}

impl CompatibilityEntry {
    pub fn matches(&self, versions: &VersionSet) -> bool {
        self.flutter.matches(versions.flutter.as_semver())
            && self.patrol_cli.matches(versions.patrol_cli.as_semver())
            && self.patrol.matches(versions.patrol.as_semver())
    }
}

/// An ordered list of accepted version combinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatibilityTable {
    pub rules: Vec<CompatibilityEntry>,
}

impl CompatibilityTable {
    pub fn new(rules: Vec<CompatibilityEntry>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// A declared table must hold at least one rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::CompatibilityTable(
                "the [compatibility] section declares no rules".to_string(),
            ));
        }
        Ok(())
    }
}

impl CompatibilityRule for CompatibilityTable {
    fn is_compatible(&self, versions: &VersionSet) -> bool {
        self.rules.iter().any(|rule| rule.matches(versions))
    }

    fn describe(&self) -> String {
        format!("compatibility table with {} rule(s)", self.rules.len())
    }
}

/// Applies `rule` to `versions`.
pub fn check_compatibility(rule: &dyn CompatibilityRule, versions: &VersionSet) -> bool {
    rule.is_compatible(versions)
}
