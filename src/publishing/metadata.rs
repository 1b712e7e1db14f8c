//! Artifact-level `maven-metadata.xml`

use crate::build::pom::escape_xml;
use crate::core::coordinates::{Channel, Coordinates};
use crate::core::error::PublishError;
use chrono::{DateTime, Utc};
use regex::Regex;

/// File name of the artifact-level metadata
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// Versioning record of one artifact in a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenMetadata {
    pub group: String,
    pub artifact: String,
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
    pub last_updated: Option<String>,
}

impl MavenMetadata {
    pub fn new(coordinates: &Coordinates) -> Self {
        Self {
            group: coordinates.group.clone(),
            artifact: coordinates.artifact.clone(),
            latest: None,
            release: None,
            versions: Vec::new(),
            last_updated: None,
        }
    }

    /// Read existing metadata; unknown elements are dropped
    ///
    /// # Errors
    ///
    /// `PublishError::UploadFailed` when `xml` has no `<metadata>` root or
    /// describes another artifact. The caller fills in the URL.
    pub fn parse(coordinates: &Coordinates, xml: &str) -> Result<Self, PublishError> {
        let invalid = |message: String| PublishError::UploadFailed {
            url: METADATA_FILE.to_string(),
            message,
        };

        let root = first_block(xml, "metadata")
            .ok_or_else(|| invalid("既存のメタデータに <metadata> 要素がありません".to_string()))?;
        for (tag, expected) in [
            ("groupId", &coordinates.group),
            ("artifactId", &coordinates.artifact),
        ] {
            let found = first_text(&root, tag);
            if found.as_deref() != Some(expected.as_str()) {
                return Err(invalid(format!(
                    "既存のメタデータの {} が一致しません (期待値: {}, 実際: {})",
                    tag,
                    expected,
                    found.unwrap_or_default()
                )));
            }
        }

        let xml = root.as_str();
        let mut metadata = Self::new(coordinates);
        metadata.latest = first_text(xml, "latest");
        metadata.release = first_text(xml, "release");
        metadata.last_updated = first_text(xml, "lastUpdated");

        if let Some(block) = first_block(xml, "versions") {
            metadata.versions = all_text(&block, "version");
        }
        Ok(metadata)
    }

    /// Record a newly published version
    ///
    /// `release` only moves for release-channel versions.
    pub fn add_version(&mut self, version: &str, channel: Channel, now: DateTime<Utc>) {
        if !self.versions.iter().any(|v| v == version) {
            self.versions.push(version.to_string());
        }
        self.latest = Some(version.to_string());
        if channel == Channel::Release {
            self.release = Some(version.to_string());
        }
        self.last_updated = Some(now.format("%Y%m%d%H%M%S").to_string());
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata>\n");
        out.push_str(&format!("  <groupId>{}</groupId>\n", escape_xml(&self.group)));
        out.push_str(&format!(
            "  <artifactId>{}</artifactId>\n",
            escape_xml(&self.artifact)
        ));
        out.push_str("  <versioning>\n");
        if let Some(latest) = &self.latest {
            out.push_str(&format!("    <latest>{}</latest>\n", escape_xml(latest)));
        }
        if let Some(release) = &self.release {
            out.push_str(&format!("    <release>{}</release>\n", escape_xml(release)));
        }
        out.push_str("    <versions>\n");
        for version in &self.versions {
            out.push_str(&format!("      <version>{}</version>\n", escape_xml(version)));
        }
        out.push_str("    </versions>\n");
        if let Some(last_updated) = &self.last_updated {
            out.push_str(&format!(
                "    <lastUpdated>{}</lastUpdated>\n",
                escape_xml(last_updated)
            ));
        }
        out.push_str("  </versioning>\n</metadata>\n");
        out
    }
}

fn element_regex(tag: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?s)<{tag}(?:\s[^>]*)?>\s*(.*?)\s*</{tag}>")).ok()
}

fn first_block(xml: &str, tag: &str) -> Option<String> {
    element_regex(tag)?
        .captures(xml)
        .map(|cap| cap[1].to_string())
}

fn first_text(xml: &str, tag: &str) -> Option<String> {
    first_block(xml, tag)
        .map(|text| unescape_xml(&text))
        .filter(|text| !text.is_empty())
}

fn all_text(xml: &str, tag: &str) -> Vec<String> {
    match element_regex(tag) {
        Some(regex) => regex
            .captures_iter(xml)
            .map(|cap| unescape_xml(&cap[1]))
            .collect(),
        None => Vec::new(),
    }
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn coords() -> Coordinates {
        Coordinates::new("com.deepl.api", "deepl-java", "1.3.0")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()
    }

    const EXISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>com.deepl.api</groupId>
  <artifactId>deepl-java</artifactId>
  <versioning>
    <latest>1.2.0</latest>
    <release>1.2.0</release>
    <versions>
      <version>1.1.0</version>
      <version>1.2.0</version>
    </versions>
    <lastUpdated>20230101000000</lastUpdated>
  </versioning>
</metadata>
"#;

    #[test]
    fn test_parse_existing() {
        let metadata = MavenMetadata::parse(&coords(), EXISTING).unwrap();

        assert_eq!(metadata.versions, vec!["1.1.0", "1.2.0"]);
        assert_eq!(metadata.release.as_deref(), Some("1.2.0"));
        assert_eq!(metadata.last_updated.as_deref(), Some("20230101000000"));
    }

    #[test]
    fn test_release_advances_release() {
        let mut metadata = MavenMetadata::parse(&coords(), EXISTING).unwrap();
        metadata.add_version("1.3.0", Channel::Release, now());

        assert_eq!(metadata.versions, vec!["1.1.0", "1.2.0", "1.3.0"]);
        assert_eq!(metadata.latest.as_deref(), Some("1.3.0"));
        assert_eq!(metadata.release.as_deref(), Some("1.3.0"));
        assert_eq!(metadata.last_updated.as_deref(), Some("20240301123005"));
    }

    #[test]
    fn test_snapshot_keeps_release() {
        let mut metadata = MavenMetadata::parse(&coords(), EXISTING).unwrap();
        metadata.add_version("1.4.0-SNAPSHOT", Channel::Snapshot, now());

        assert_eq!(metadata.latest.as_deref(), Some("1.4.0-SNAPSHOT"));
        assert_eq!(metadata.release.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn test_republish_does_not_duplicate() {
        let mut metadata = MavenMetadata::parse(&coords(), EXISTING).unwrap();
        metadata.add_version("1.2.0", Channel::Release, now());

        assert_eq!(metadata.versions.len(), 2);
    }

    #[test]
    fn test_render_parse_cycle() {
        let mut metadata = MavenMetadata::new(&coords());
        metadata.add_version("1.3.0", Channel::Release, now());

        let rendered = metadata.render();
        assert!(rendered.contains("<release>1.3.0</release>"));
        assert_eq!(MavenMetadata::parse(&coords(), &rendered).unwrap(), metadata);
    }

    #[test]
    fn test_root_attributes_accepted() {
        let xml = EXISTING.replace("<metadata>", r#"<metadata modelVersion="1.1.0">"#);
        let metadata = MavenMetadata::parse(&coords(), &xml).unwrap();

        assert_eq!(metadata.versions, vec!["1.1.0", "1.2.0"]);
    }

    #[test]
    fn test_error_page_rejected() {
        let result = MavenMetadata::parse(&coords(), "<html>502 Bad Gateway</html>");

        assert!(matches!(result, Err(PublishError::UploadFailed { .. })));
    }

    #[test]
    fn test_other_artifact_rejected() {
        let other = EXISTING.replace("deepl-java", "deepl-kotlin");
        let result = MavenMetadata::parse(&coords(), &other);

        match result {
            Err(PublishError::UploadFailed { message, .. }) => {
                assert!(message.contains("artifactId"));
                assert!(message.contains("deepl-kotlin"));
            }
            other => panic!("Expected UploadFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_group_rejected() {
        let xml = "<metadata><artifactId>deepl-java</artifactId></metadata>";

        assert!(MavenMetadata::parse(&coords(), xml).is_err());
    }
}
