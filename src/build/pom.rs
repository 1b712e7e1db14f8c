//! POM descriptor generation

use crate::core::config::PublishConfig;
use crate::core::coordinates::Coordinates;
use crate::core::error::PublishError;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders the publication descriptor from configuration
pub struct PomGenerator<'a> {
    config: &'a PublishConfig,
}

impl<'a> PomGenerator<'a> {
    pub fn new(config: &'a PublishConfig) -> Self {
        Self { config }
    }

    /// Properties written to the POM
    ///
    /// `java.version` and both encodings derive from the java section;
    /// entries under `pom.properties` override or extend them.
    pub fn properties(&self) -> BTreeMap<String, String> {
        let java = &self.config.java;
        let mut properties = BTreeMap::new();
        properties.insert("java.version".to_string(), java.target_compatibility.clone());
        properties.insert(
            "project.build.sourceEncoding".to_string(),
            java.source_encoding.clone(),
        );
        properties.insert(
            "project.reporting.outputEncoding".to_string(),
            java.source_encoding.clone(),
        );
        properties.extend(self.config.pom.properties.clone());
        properties
    }

    pub fn generate(&self) -> Result<String, PublishError> {
        let config = self.config;
        let project = &config.project;
        let pom = &config.pom;

        let mut xml = XmlWriter::default();
        xml.raw(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.raw(
            r#"<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd">"#,
        );
        xml.indent += 1;
        xml.element("modelVersion", "4.0.0");
        xml.element("groupId", &project.group);
        xml.element("artifactId", &project.artifact);
        xml.element("version", &project.version);
        xml.element("name", config.display_name());
        if let Some(description) = &project.description {
            xml.element("description", description);
        }
        if let Some(url) = &project.url {
            xml.element("url", url);
        }

        let properties = self.properties();
        xml.open("properties");
        for (key, value) in &properties {
            xml.element(key, value);
        }
        xml.close("properties");

        if !pom.licenses.is_empty() {
            xml.open("licenses");
            for license in &pom.licenses {
                xml.open("license");
                xml.element("name", &license.name);
                xml.element("url", &license.url);
                xml.close("license");
            }
            xml.close("licenses");
        }

        if !pom.developers.is_empty() {
            xml.open("developers");
            for developer in &pom.developers {
                xml.open("developer");
                xml.element("id", &developer.id);
                xml.element("name", &developer.name);
                if let Some(email) = &developer.email {
                    xml.element("email", email);
                }
                xml.close("developer");
            }
            xml.close("developers");
        }

        if let Some(organization) = &pom.organization {
            xml.open("organization");
            xml.element("name", &organization.name);
            xml.element("url", &organization.url);
            xml.close("organization");
        }

        if let Some(scm) = &pom.scm {
            xml.open("scm");
            xml.element("connection", &scm.connection);
            xml.element("developerConnection", &scm.developer_connection);
            xml.element("url", &scm.url);
            xml.close("scm");
        }

        let published: Vec<(Coordinates, &'static str)> = config
            .dependencies
            .iter()
            .filter_map(|d| d.scope.pom_scope().map(|scope| (d, scope)))
            .map(|(d, scope)| Coordinates::parse(&d.coordinates).map(|c| (c, scope)))
            .collect::<Result<_, _>>()?;

        if !published.is_empty() {
            xml.open("dependencies");
            for (coordinates, scope) in &published {
                xml.open("dependency");
                xml.element("groupId", &coordinates.group);
                xml.element("artifactId", &coordinates.artifact);
                xml.element("version", &coordinates.version);
                xml.element("scope", scope);
                xml.close("dependency");
            }
            xml.close("dependencies");
        }

        xml.indent -= 1;
        xml.raw("</project>");
        Ok(xml.finish())
    }

    /// Write `<artifact>-<version>.pom` into `dir`
    pub fn write(&self, dir: &Path) -> Result<PathBuf, PublishError> {
        let project = &self.config.project;
        let coordinates = Coordinates::new(&project.group, &project.artifact, &project.version);
        let path = dir.join(coordinates.file_name(None, "pom"));

        let content = self.generate()?;
        fs::create_dir_all(dir)?;
        fs::write(&path, content)?;
        Ok(path)
    }
}

/// Escape text for use in XML element content
///
/// # Examples
///
/// ```
/// use maven_publisher::build::pom::escape_xml;
///
/// assert_eq!(escape_xml("R&D <\"DeepL\">"), "R&amp;D &lt;&quot;DeepL&quot;&gt;");
/// ```
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Default)]
struct XmlWriter {
    out: String,
    indent: usize,
}

impl XmlWriter {
    fn pad(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn raw(&mut self, line: &str) {
        self.pad();
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.raw(&format!("<{}>", tag));
        self.indent += 1;
    }

    fn close(&mut self, tag: &str) {
        self.indent -= 1;
        self.raw(&format!("</{}>", tag));
    }

    fn element(&mut self, tag: &str, text: &str) {
        self.pad();
        let _ = writeln!(self.out, "<{tag}>{}</{tag}>", escape_xml(text));
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::*;
    use tempfile::TempDir;

    fn deepl_config() -> PublishConfig {
        let mut config = PublishConfig::default();
        config.project = ProjectConfig {
            group: "com.deepl.api".to_string(),
            artifact: "deepl-java".to_string(),
            version: "1.3.0".to_string(),
            name: Some("deepl-java".to_string()),
            description: Some("DeepL API Java Client Library".to_string()),
            url: Some("https://www.github.com/DeepLcom/deepl-java".to_string()),
        };
        config.pom = PomConfig {
            properties: BTreeMap::new(),
            licenses: vec![LicenseConfig {
                name: "MIT License".to_string(),
                url: "https://www.opensource.org/licenses/mit-license.php".to_string(),
            }],
            developers: vec![DeveloperConfig {
                id: "deepl".to_string(),
                name: "DeepL SE".to_string(),
                email: Some("open-source@deepl.com".to_string()),
            }],
            organization: Some(OrganizationConfig {
                name: "DeepL SE".to_string(),
                url: "https://www.deepl.com".to_string(),
            }),
            scm: Some(ScmConfig {
                connection: "scm:git:git://github.com/DeepLcom/deepl-java.git".to_string(),
                developer_connection: "scm:git:ssh://github.com/DeepLcom/deepl-java.git"
                    .to_string(),
                url: "https://www.github.com/DeepLcom/deepl-java".to_string(),
            }),
        };
        config.dependencies = vec![
            DependencyDeclaration {
                coordinates: "org.jetbrains:annotations:20.1.0".to_string(),
                scope: DependencyScope::Implementation,
            },
            DependencyDeclaration {
                coordinates: "com.google.code.gson:gson:2.9.0".to_string(),
                scope: DependencyScope::Api,
            },
            DependencyDeclaration {
                coordinates: "org.junit.jupiter:junit-jupiter:5.8.1".to_string(),
                scope: DependencyScope::TestImplementation,
            },
        ];
        config
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("{} not found", needle))
    }

    #[test]
    fn test_metadata_fields_round_trip() {
        let pom = PomGenerator::new(&deepl_config()).generate().unwrap();

        for expected in [
            "<groupId>com.deepl.api</groupId>",
            "<artifactId>deepl-java</artifactId>",
            "<version>1.3.0</version>",
            "<name>deepl-java</name>",
            "<description>DeepL API Java Client Library</description>",
            "<url>https://www.github.com/DeepLcom/deepl-java</url>",
            "<java.version>1.8</java.version>",
            "<project.build.sourceEncoding>UTF-8</project.build.sourceEncoding>",
            "<project.reporting.outputEncoding>UTF-8</project.reporting.outputEncoding>",
            "<name>MIT License</name>",
            "<url>https://www.opensource.org/licenses/mit-license.php</url>",
            "<id>deepl</id>",
            "<name>DeepL SE</name>",
            "<email>open-source@deepl.com</email>",
            "<url>https://www.deepl.com</url>",
            "<connection>scm:git:git://github.com/DeepLcom/deepl-java.git</connection>",
            "<developerConnection>scm:git:ssh://github.com/DeepLcom/deepl-java.git</developerConnection>",
        ] {
            assert!(pom.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_section_order() {
        let pom = PomGenerator::new(&deepl_config()).generate().unwrap();

        let order = [
            "<modelVersion>",
            "<description>",
            "<properties>",
            "<licenses>",
            "<developers>",
            "<organization>",
            "<scm>",
            "<dependencies>",
        ];
        let positions: Vec<usize> = order.iter().map(|tag| position(&pom, tag)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
    }

    #[test]
    fn test_dependency_scopes() {
        let pom = PomGenerator::new(&deepl_config()).generate().unwrap();

        let annotations = position(&pom, "<artifactId>annotations</artifactId>");
        let gson = position(&pom, "<artifactId>gson</artifactId>");
        assert!(pom[annotations..gson].contains("<scope>runtime</scope>"));
        assert!(pom[gson..].contains("<scope>compile</scope>"));
        assert!(!pom.contains("junit"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut config = deepl_config();
        config.project.description = Some("Translate <text> & \"more\"".to_string());

        let pom = PomGenerator::new(&config).generate().unwrap();

        assert!(pom.contains(
            "<description>Translate &lt;text&gt; &amp; &quot;more&quot;</description>"
        ));
    }

    #[test]
    fn test_property_override() {
        let mut config = deepl_config();
        config
            .pom
            .properties
            .insert("java.version".to_string(), "11".to_string());

        let properties = PomGenerator::new(&config).properties();

        assert_eq!(properties.get("java.version").map(String::as_str), Some("11"));
        assert_eq!(properties.len(), 3);
    }

    #[test]
    fn test_write_pom_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = PomGenerator::new(&deepl_config())
            .write(temp_dir.path())
            .unwrap();

        assert!(path.ends_with("deepl-java-1.3.0.pom"));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("<?xml"));
        assert!(content.trim_end().ends_with("</project>"));
    }

    #[test]
    fn test_invalid_dependency_is_rejected() {
        let mut config = deepl_config();
        config.dependencies.push(DependencyDeclaration {
            coordinates: "broken".to_string(),
            scope: DependencyScope::Api,
        });

        assert!(PomGenerator::new(&config).generate().is_err());
    }
}
