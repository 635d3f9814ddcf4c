//! Semantic version extraction from tool output.
//!
//! Two matching modes are supported:
//!
//! - [`extract_prefixed_version`] finds `MAJOR.MINOR.PATCH` right after a
//!   banner phrase anywhere in the text (`Flutter 3.35.7 • channel stable`).
//! - [`extract_dependency_version`] reads the compact dependency listing of
//!   `flutter pub deps --style=compact`, where a package line looks like
//!   `- patrol 3.15.1 [flutter ...]`.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::types::StepError;

/// A parsed `MAJOR.MINOR.PATCH[-pre][+build]` version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion(semver::Version);

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// The underlying `semver` value, for matching against requirements.
    pub fn as_semver(&self) -> &semver::Version {
        &self.0
    }
}

impl FromStr for SemanticVersion {
    type Err = StepError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_version(value)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trims surrounding whitespace and a single leading `v`.
pub fn clean_version(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix('v').unwrap_or(trimmed)
}

/// Parses a version string after [`clean_version`].
///
/// Anything that is not a full three-component version is rejected with
/// [`StepError::MalformedVersion`]; nothing is coerced.
///
/// # Example
///
/// ```
/// use patrol_step_sdk::version::parse_version;
///
/// let version = parse_version(" v3.15.1+1 ").unwrap();
/// assert_eq!(version.to_string(), "3.15.1+1");
/// assert!(parse_version("b3.v15.1+1").is_err());
/// ```
pub fn parse_version(raw: &str) -> Result<SemanticVersion, StepError> {
    let cleaned = clean_version(raw);
    semver::Version::parse(cleaned)
        .map(SemanticVersion)
        .map_err(|source| StepError::MalformedVersion {
            input: cleaned.to_string(),
            source,
        })
}

/// Builds the banner pattern for `prefix`: the phrase, then any run of `:` or
/// whitespace, an optional `v`, and the version digits. Case-insensitive.
pub fn prefixed_version_pattern(prefix: &str) -> Result<Regex, StepError> {
    let pattern = format!(r"(?i){}[\s:]*v?(\d+\.\d+\.\d+)", regex::escape(prefix));
    Ok(Regex::new(&pattern)?)
}

/// Returns the first version that follows `prefix` in `text`.
///
/// # Example
///
/// ```
/// use patrol_step_sdk::version::extract_prefixed_version;
///
/// let output = "Flutter 3.35.7 • channel stable • https://github.com/flutter/flutter.git";
/// let version = extract_prefixed_version(output, "Flutter").unwrap();
/// assert_eq!(version.to_string(), "3.35.7");
/// ```
pub fn extract_prefixed_version(text: &str, prefix: &str) -> Result<SemanticVersion, StepError> {
    let captured = prefixed_version_pattern(prefix)?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| StepError::NotFound(format!("'{}' version in output", prefix)))?;
    parse_version(captured.as_str())
}

/// Returns the pinned version of `package` from a compact dependency listing.
///
/// Only a line whose trimmed form starts with `- <package> ` counts, so
/// `- patrol_finders 2.7.2` never matches `patrol`. The version is the third
/// whitespace-separated field.
pub fn extract_dependency_version(text: &str, package: &str) -> Result<SemanticVersion, StepError> {
    let marker = format!("- {} ", package);
    for line in text.lines() {
        if !line.trim_start().starts_with(&marker) {
            continue;
        }
        if let Some(raw) = line.split_whitespace().nth(2) {
            return parse_version(raw);
        }
    }
    Err(StepError::NotFound(format!(
        "package '{}' in dependency listing",
        package
    )))
}
