//! Configuration structures for maven-publisher
//!
//! The configuration lives in `.publish-config.yaml` and carries everything
//! the release needs except secrets: coordinates, dependencies, formatting
//! policy, manifest, POM metadata and the names of the environment
//! variables that hold credentials.

use super::coordinates::DEFAULT_SNAPSHOT_MARKER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maven Central, used when no repositories are configured
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2/";

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PublishConfig {
    /// Schema version
    pub version: String,

    /// Extend from base configuration file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    pub project: ProjectConfig,

    pub java: JavaConfig,

    /// Repositories used for dependency resolution, tried in order
    pub repositories: Vec<String>,

    pub dependencies: Vec<DependencyDeclaration>,

    pub formatting: FormattingConfig,

    pub manifest: ManifestConfig,

    pub pom: PomConfig,

    pub publishing: PublishingConfig,

    pub signing: SigningConfig,

    pub security: SecurityConfig,

    pub build: BuildDirConfig,
}

/// Project coordinates and descriptive information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Group identifier (e.g., "com.deepl.api")
    pub group: String,

    /// Artifact name (e.g., "deepl-java")
    pub artifact: String,

    /// Version string; a trailing snapshot marker selects the snapshot channel
    pub version: String,

    /// Human readable project name (defaults to the artifact name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Homepage URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Java compilation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JavaConfig {
    #[serde(rename = "sourceCompatibility")]
    pub source_compatibility: String,

    #[serde(rename = "targetCompatibility")]
    pub target_compatibility: String,

    #[serde(rename = "sourceEncoding")]
    pub source_encoding: String,

    #[serde(rename = "sourceDir")]
    pub source_dir: String,

    /// Resources copied into the primary archive when the directory exists
    #[serde(rename = "resourcesDir")]
    pub resources_dir: String,
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            source_compatibility: "1.8".to_string(),
            target_compatibility: "1.8".to_string(),
            source_encoding: "UTF-8".to_string(),
            source_dir: "src/main/java".to_string(),
            resources_dir: "src/main/resources".to_string(),
        }
    }
}

/// Dependency scope, named after Gradle configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DependencyScope {
    Api,
    #[default]
    Implementation,
    CompileOnly,
    RuntimeOnly,
    TestImplementation,
}

impl DependencyScope {
    /// Whether the dependency belongs on the main compile classpath
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Api | Self::Implementation | Self::CompileOnly)
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Self::TestImplementation)
    }

    /// Scope written to the POM, `None` when the dependency is not published
    pub fn pom_scope(&self) -> Option<&'static str> {
        match self {
            Self::Api => Some("compile"),
            Self::Implementation | Self::RuntimeOnly => Some("runtime"),
            Self::CompileOnly | Self::TestImplementation => None,
        }
    }
}

/// A declared library dependency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyDeclaration {
    /// `group:artifact:version`
    pub coordinates: String,

    #[serde(default)]
    pub scope: DependencyScope,
}

/// Formatting behaviour
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Rewrite files in place
    #[default]
    Apply,
    /// Fail when any file would change
    Check,
}

/// Formatting enforcement settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormattingConfig {
    pub enabled: bool,

    pub mode: FormatMode,

    /// Formatter executable
    pub tool: String,

    /// Expected formatter version, reported in `check` output
    #[serde(rename = "toolVersion", skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,

    #[serde(rename = "removeUnusedImports")]
    pub remove_unused_imports: bool,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: FormatMode::Apply,
            tool: "google-java-format".to_string(),
            tool_version: Some("1.7".to_string()),
            remove_unused_imports: true,
        }
    }
}

/// Manifest attributes shared by all archives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManifestConfig {
    #[serde(rename = "implementationTitle")]
    pub implementation_title: String,

    /// Extra attributes appended after the implementation attributes
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            implementation_title: "Gradle".to_string(),
            attributes: BTreeMap::new(),
        }
    }
}

/// POM metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PomConfig {
    /// Extra properties; compatibility level and encoding are derived from
    /// the java section unless overridden here
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    pub licenses: Vec<LicenseConfig>,

    pub developers: Vec<DeveloperConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm: Option<ScmConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LicenseConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeveloperConfig {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScmConfig {
    pub connection: String,
    #[serde(rename = "developerConnection")]
    pub developer_connection: String,
    pub url: String,
}

/// Upload destination settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PublishingConfig {
    #[serde(rename = "repositoryName")]
    pub repository_name: String,

    /// Staging endpoint for release versions
    #[serde(rename = "releasesUrl")]
    pub releases_url: String,

    /// Endpoint for snapshot versions
    #[serde(rename = "snapshotsUrl")]
    pub snapshots_url: String,

    /// Version suffix that selects the snapshot endpoint
    #[serde(rename = "snapshotMarker")]
    pub snapshot_marker: String,

    pub credentials: CredentialsConfig,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            repository_name: "MavenCentral".to_string(),
            releases_url: "https://s01.oss.sonatype.org/service/local/staging/deploy/maven2/"
                .to_string(),
            snapshots_url: "https://s01.oss.sonatype.org/content/repositories/snapshots/"
                .to_string(),
            snapshot_marker: DEFAULT_SNAPSHOT_MARKER.to_string(),
            credentials: CredentialsConfig::default(),
        }
    }
}

/// Names of the environment variables holding upload credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CredentialsConfig {
    #[serde(rename = "usernameEnv")]
    pub username_env: String,

    #[serde(rename = "passwordEnv")]
    pub password_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username_env: "MAVEN_UPLOAD_USERNAME".to_string(),
            password_env: "MAVEN_UPLOAD_PASSWORD".to_string(),
        }
    }
}

/// Signing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SigningConfig {
    pub enabled: bool,

    /// Environment variable holding the armored signing key
    #[serde(rename = "keyEnv")]
    pub key_env: String,

    /// Environment variable holding the key passphrase
    #[serde(rename = "passwordEnv")]
    pub password_env: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_env: "SIGNING_KEY".to_string(),
            password_env: "SIGNING_PASSWORD".to_string(),
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SecurityConfig {
    #[serde(rename = "envVarExpansion")]
    pub env_var_expansion: EnvVarExpansionConfig,

    #[serde(rename = "secretsScanning")]
    pub secrets_scanning: SecretsScanningConfig,
}

/// Environment variable expansion configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvVarExpansionConfig {
    pub enabled: bool,

    /// Allowed environment variable prefixes (default: all)
    #[serde(rename = "allowedPrefixes", skip_serializing_if = "Option::is_none")]
    pub allowed_prefixes: Option<Vec<String>>,
}

impl Default for EnvVarExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_prefixes: None,
        }
    }
}

/// Secrets scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecretsScanningConfig {
    pub enabled: bool,

    /// Glob patterns excluded from scanning
    #[serde(rename = "ignorePatterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for SecretsScanningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ignore_patterns: Vec::new(),
        }
    }
}

/// Build output location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildDirConfig {
    #[serde(rename = "outputDir")]
    pub output_dir: String,
}

impl Default for BuildDirConfig {
    fn default() -> Self {
        Self {
            output_dir: "build".to_string(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            extends: None,
            project: ProjectConfig::default(),
            java: JavaConfig::default(),
            repositories: vec![MAVEN_CENTRAL_URL.to_string()],
            dependencies: Vec::new(),
            formatting: FormattingConfig::default(),
            manifest: ManifestConfig::default(),
            pom: PomConfig::default(),
            publishing: PublishingConfig::default(),
            signing: SigningConfig::default(),
            security: SecurityConfig::default(),
            build: BuildDirConfig::default(),
        }
    }
}

impl PublishConfig {
    /// Display name of the project, falling back to the artifact name
    pub fn display_name(&self) -> &str {
        self.project
            .name
            .as_deref()
            .unwrap_or(self.project.artifact.as_str())
    }
}
