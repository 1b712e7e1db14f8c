//! Version Validator - Validates Maven version strings
//!
//! Maven versions are looser than semver: `1.3.0`, `1.3`, `1.3.0-SNAPSHOT`
//! and `20240301` are all legal. A version must consist of letters, digits
//! and `. _ + -`, and must not start or end with a separator. Semver
//! details are filled in when the string also parses as semver.
//!
//! # Example
//!
//! ```
//! use maven_publisher::validation::version_validator::VersionValidator;
//!
//! let validator = VersionValidator::new();
//! let result = validator.validate("1.3.0-SNAPSHOT");
//!
//! assert!(result.is_valid);
//! assert!(result.is_snapshot);
//! assert_eq!(result.major, Some(1));
//! assert_eq!(result.minor, Some(3));
//! ```

use crate::core::coordinates::{Channel, DEFAULT_SNAPSHOT_MARKER};
use crate::core::error::PublishError;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Result of version validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionValidationResult {
    /// Whether the version is a legal Maven version
    pub is_valid: bool,
    /// Validation error message (if any)
    pub error: Option<String>,
    /// Whether the version selects the snapshot channel
    pub is_snapshot: bool,
    /// Major version number
    pub major: Option<u64>,
    /// Minor version number
    pub minor: Option<u64>,
    /// Patch version number
    pub patch: Option<u64>,
    /// Pre-release part (e.g., "SNAPSHOT", "beta.1")
    pub prerelease: Option<String>,
    /// Build metadata
    pub build: Option<String>,
}

impl VersionValidationResult {
    fn invalid(message: String) -> Self {
        Self {
            is_valid: false,
            error: Some(message),
            is_snapshot: false,
            major: None,
            minor: None,
            patch: None,
            prerelease: None,
            build: None,
        }
    }
}

/// Validator for Maven version strings
pub struct VersionValidator {
    snapshot_marker: String,
}

impl Default for VersionValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionValidator {
    /// Create a validator using the default `SNAPSHOT` marker
    pub fn new() -> Self {
        Self::with_marker(DEFAULT_SNAPSHOT_MARKER)
    }

    pub fn with_marker(marker: &str) -> Self {
        Self {
            snapshot_marker: marker.to_string(),
        }
    }

    /// Validate a version string
    ///
    /// # Examples
    ///
    /// ```
    /// use maven_publisher::validation::version_validator::VersionValidator;
    ///
    /// let validator = VersionValidator::new();
    ///
    /// assert!(validator.validate("1.3.0").is_valid);
    /// assert!(!validator.validate("1.3.0 final").is_valid);
    /// assert!(!validator.validate("-1.3.0").is_valid);
    /// ```
    pub fn validate(&self, version_str: &str) -> VersionValidationResult {
        if version_str.is_empty() {
            return VersionValidationResult::invalid("バージョンが空です".to_string());
        }

        if let Some(c) = version_str
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')))
        {
            return VersionValidationResult::invalid(format!("使用できない文字です: {:?}", c));
        }

        let is_separator = |c: char| matches!(c, '.' | '_' | '+' | '-');
        if version_str.starts_with(is_separator) || version_str.ends_with(is_separator) {
            return VersionValidationResult::invalid(
                "区切り文字で始まるまたは終わるバージョンは使用できません".to_string(),
            );
        }

        let is_snapshot = self.is_snapshot(version_str);
        match Version::parse(version_str) {
            Ok(version) => VersionValidationResult {
                is_valid: true,
                error: None,
                is_snapshot,
                major: Some(version.major),
                minor: Some(version.minor),
                patch: Some(version.patch),
                prerelease: (!version.pre.is_empty()).then(|| version.pre.to_string()),
                build: (!version.build.is_empty()).then(|| version.build.to_string()),
            },
            Err(_) => {
                let mut numbers = version_str
                    .split(['.', '-'])
                    .map_while(|part| part.parse::<u64>().ok());
                VersionValidationResult {
                    is_valid: true,
                    error: None,
                    is_snapshot,
                    major: numbers.next(),
                    minor: numbers.next(),
                    patch: numbers.next(),
                    prerelease: None,
                    build: None,
                }
            }
        }
    }

    /// Validate and convert a failure into a [`PublishError`]
    pub fn ensure_valid(&self, version_str: &str) -> Result<VersionValidationResult, PublishError> {
        let result = self.validate(version_str);
        match &result.error {
            Some(message) if !result.is_valid => Err(PublishError::InvalidVersion {
                version: version_str.to_string(),
                message: message.clone(),
            }),
            _ => Ok(result),
        }
    }

    /// Check if a version selects the snapshot channel
    ///
    /// # Examples
    ///
    /// ```
    /// use maven_publisher::validation::version_validator::VersionValidator;
    ///
    /// let validator = VersionValidator::new();
    ///
    /// assert!(validator.is_snapshot("1.3.0-SNAPSHOT"));
    /// assert!(!validator.is_snapshot("1.3.0"));
    /// ```
    pub fn is_snapshot(&self, version_str: &str) -> bool {
        Channel::for_version(version_str, &self.snapshot_marker) == Channel::Snapshot
    }

    /// Compare two versions when both parse as semver
    pub fn compare(&self, v1: &str, v2: &str) -> Option<std::cmp::Ordering> {
        let version1 = Version::parse(v1).ok()?;
        let version2 = Version::parse(v2).ok()?;
        Some(version1.cmp(&version2))
    }
}
