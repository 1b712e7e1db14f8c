//! Package coordinates and release channels

use super::error::PublishError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default suffix marking a snapshot version
pub const DEFAULT_SNAPSHOT_MARKER: &str = "SNAPSHOT";

/// Release channel selected by the version string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Release,
    Snapshot,
}

impl Channel {
    /// Select the channel for `version`.
    ///
    /// Plain suffix match: any version ending in `marker` is a snapshot.
    pub fn for_version(version: &str, marker: &str) -> Self {
        if !marker.is_empty() && version.ends_with(marker) {
            Channel::Snapshot
        } else {
            Channel::Release
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Release => "release",
            Channel::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group/artifact/version triple identifying a package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinates {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Parse `group:artifact:version`
    ///
    /// # Examples
    ///
    /// ```
    /// use maven_publisher::core::Coordinates;
    ///
    /// let coords = Coordinates::parse("com.google.code.gson:gson:2.9.0").unwrap();
    /// assert_eq!(coords.artifact, "gson");
    /// assert_eq!(coords.version, "2.9.0");
    /// ```
    pub fn parse(notation: &str) -> Result<Self, PublishError> {
        let parts: Vec<&str> = notation.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *artifact, *version))
            }
            _ => Err(PublishError::DependencyResolution {
                coordinates: notation.to_string(),
                message: "expected group:artifact:version".to_string(),
            }),
        }
    }

    pub fn channel(&self, marker: &str) -> Channel {
        Channel::for_version(&self.version, marker)
    }

    /// Directory of this version inside a Maven repository,
    /// e.g. `com/deepl/api/deepl-java/1.3.0`
    pub fn version_path(&self) -> String {
        format!("{}/{}", self.artifact_path(), self.version)
    }

    /// Directory of the artifact inside a Maven repository,
    /// e.g. `com/deepl/api/deepl-java`
    pub fn artifact_path(&self) -> String {
        format!("{}/{}", self.group.replace('.', "/"), self.artifact)
    }

    /// File name for a variant of this artifact
    ///
    /// # Examples
    ///
    /// ```
    /// use maven_publisher::core::Coordinates;
    ///
    /// let coords = Coordinates::new("com.deepl.api", "deepl-java", "1.3.0");
    /// assert_eq!(coords.file_name(None, "jar"), "deepl-java-1.3.0.jar");
    /// assert_eq!(coords.file_name(Some("sources"), "jar"), "deepl-java-1.3.0-sources.jar");
    /// ```
    pub fn file_name(&self, classifier: Option<&str>, extension: &str) -> String {
        match classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, extension),
        }
    }
}

/// Join a repository base URL and a relative path with exactly one `/`
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}
