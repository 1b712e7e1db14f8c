//! Configuration file loader for maven-publisher
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use super::coordinates::Coordinates;
use crate::core::error::PublishError;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".publish-config.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Values given on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub version: Option<String>,
    pub format_mode: Option<FormatMode>,
}

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// CLI arguments (highest priority)
    pub overrides: ConfigOverrides,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options reading the process environment
    pub fn from_env<P: AsRef<Path>>(project_path: P, overrides: ConfigOverrides) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            overrides,
            env: std::env::vars().collect(),
        }
    }
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "publishing.releasesUrl")
    pub field: String,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables (`PUBLISH_VERSION`, `PUBLISH_FORMAT_MODE`)
    /// 3. Project config (./.publish-config.yaml, with `extends`)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublishConfig, PublishError> {
        let config_path = options.project_path.join(CONFIG_FILENAME);

        let mut config = match Self::load_config_file(&config_path).await? {
            Some(value) => serde_yaml::from_value(value).map_err(|e| {
                PublishError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?,
            None => {
                return Err(PublishError::ConfigError(format!(
                    "{} not found in {}",
                    CONFIG_FILENAME,
                    options.project_path.display()
                )));
            }
        };

        Self::apply_env_overrides(&mut config, &options.env);
        Self::apply_overrides(&mut config, &options.overrides);

        Self::expand_env_vars(config, &options.env)
    }

    /// Parse configuration from a YAML string without `extends` handling
    pub fn from_yaml(content: &str) -> Result<PublishConfig, PublishError> {
        serde_yaml::from_str(content)
            .map_err(|e| PublishError::ConfigError(format!("Failed to parse YAML config: {}", e)))
    }

    /// Load a YAML file as a raw value, resolving `extends` chains
    fn load_config_file(
        file_path: &Path,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<Option<serde_yaml::Value>, PublishError>>
                + Send
                + '_,
        >,
    > {
        Box::pin(async move {
            if !file_path.exists() {
                return Ok(None);
            }

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                PublishError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let value: serde_yaml::Value = serde_yaml::from_str(&content).map_err(|e| {
                PublishError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?;

            let extends = value
                .get("extends")
                .and_then(|v| v.as_str())
                .map(str::to_string);

            if let Some(extends_path) = extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| {
                        PublishError::ConfigError("Invalid config file path".to_string())
                    })?
                    .join(&extends_path);

                match Self::load_config_file(&base_path).await? {
                    Some(base) => return Ok(Some(Self::merge_values(base, value))),
                    None => {
                        return Err(PublishError::ConfigError(format!(
                            "extended config not found: {}",
                            base_path.display()
                        )));
                    }
                }
            }

            Ok(Some(value))
        })
    }

    /// Deep-merge two YAML values; mappings merge key by key, everything
    /// else in `overlay` replaces `base`
    fn merge_values(base: serde_yaml::Value, overlay: serde_yaml::Value) -> serde_yaml::Value {
        match (base, overlay) {
            (serde_yaml::Value::Mapping(mut base_map), serde_yaml::Value::Mapping(overlay_map)) => {
                for (key, overlay_value) in overlay_map {
                    let merged = match base_map.remove(&key) {
                        Some(base_value) => Self::merge_values(base_value, overlay_value),
                        None => overlay_value,
                    };
                    base_map.insert(key, merged);
                }
                serde_yaml::Value::Mapping(base_map)
            }
            (_, overlay) => overlay,
        }
    }

    fn apply_env_overrides(config: &mut PublishConfig, env: &HashMap<String, String>) {
        if let Some(version) = env.get("PUBLISH_VERSION")
            && !version.trim().is_empty()
        {
            config.project.version = version.trim().to_string();
        }

        if let Some(mode) = env.get("PUBLISH_FORMAT_MODE") {
            match mode.as_str() {
                "apply" => config.formatting.mode = FormatMode::Apply,
                "check" => config.formatting.mode = FormatMode::Check,
                other => tracing::warn!("ignoring unknown PUBLISH_FORMAT_MODE value {}", other),
            }
        }
    }

    fn apply_overrides(config: &mut PublishConfig, overrides: &ConfigOverrides) {
        if let Some(version) = &overrides.version {
            config.project.version = version.clone();
        }
        if let Some(mode) = overrides.format_mode {
            config.formatting.mode = mode;
        }
    }

    /// Expand environment variables in repository URLs
    ///
    /// Only `${VAR_NAME}` references are expanded, and only for variables
    /// permitted by `security.envVarExpansion.allowedPrefixes`.
    fn expand_env_vars(
        mut config: PublishConfig,
        env: &HashMap<String, String>,
    ) -> Result<PublishConfig, PublishError> {
        if !config.security.env_var_expansion.enabled {
            return Ok(config);
        }

        let allowed_prefixes = config.security.env_var_expansion.allowed_prefixes.clone();

        config.publishing.releases_url =
            Self::expand_string(&config.publishing.releases_url, env, &allowed_prefixes)?;
        config.publishing.snapshots_url =
            Self::expand_string(&config.publishing.snapshots_url, env, &allowed_prefixes)?;

        let mut repositories = Vec::with_capacity(config.repositories.len());
        for repository in &config.repositories {
            repositories.push(Self::expand_string(repository, env, &allowed_prefixes)?);
        }
        config.repositories = repositories;

        Ok(config)
    }

    /// Expand environment variables in a single string
    fn expand_string(
        input: &str,
        env: &HashMap<String, String>,
        allowed_prefixes: &Option<Vec<String>>,
    ) -> Result<String, PublishError> {
        let env_var_regex = Regex::new(ENV_VAR_PATTERN)
            .map_err(|e| PublishError::ConfigError(e.to_string()))?;

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];

            if let Some(prefixes) = allowed_prefixes {
                let allowed = prefixes.iter().any(|prefix| var_name.starts_with(prefix));
                if !allowed {
                    tracing::warn!(
                        "environment variable {} not allowed by prefix whitelist, skipping",
                        var_name
                    );
                    continue;
                }
            }

            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            } else {
                tracing::warn!("environment variable {} not found", var_name);
            }
        }

        Ok(result)
    }

    /// Validate configuration
    pub fn validate(config: &PublishConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
                expected: Some("string (e.g., \"1.0\")".to_string()),
                actual: Some("empty".to_string()),
            });
        } else if config.version != "1.0" {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        Self::validate_project(&config.project, &mut errors);
        Self::validate_dependencies(config, &mut errors, &mut warnings);
        Self::validate_publishing(config, &mut errors, &mut warnings);

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn validate_project(project: &ProjectConfig, errors: &mut Vec<ConfigValidationError>) {
        let required = [
            ("project.group", &project.group),
            ("project.artifact", &project.artifact),
            ("project.version", &project.version),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: format!("{} is required", field),
                    expected: Some("non-empty string".to_string()),
                    actual: Some("empty".to_string()),
                });
            }
        }
    }

    fn validate_dependencies(
        config: &PublishConfig,
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        if config.repositories.is_empty() && !config.dependencies.is_empty() {
            errors.push(ConfigValidationError {
                field: "repositories".to_string(),
                message: "At least one repository is required to resolve dependencies"
                    .to_string(),
                expected: Some("non-empty array".to_string()),
                actual: Some("empty array".to_string()),
            });
        }

        for (i, repository) in config.repositories.iter().enumerate() {
            if !is_http_url(repository) {
                errors.push(ConfigValidationError {
                    field: format!("repositories[{}]", i),
                    message: "Repository must be an http(s) URL".to_string(),
                    expected: Some("https://...".to_string()),
                    actual: Some(repository.clone()),
                });
            }
        }

        for (i, dependency) in config.dependencies.iter().enumerate() {
            if Coordinates::parse(&dependency.coordinates).is_err() {
                errors.push(ConfigValidationError {
                    field: format!("dependencies[{}].coordinates", i),
                    message: "Invalid dependency coordinates".to_string(),
                    expected: Some("group:artifact:version".to_string()),
                    actual: Some(dependency.coordinates.clone()),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for dependency in &config.dependencies {
            if !seen.insert(dependency.coordinates.as_str()) {
                warnings.push(ConfigValidationWarning {
                    field: "dependencies".to_string(),
                    message: format!("Duplicate dependency: {}", dependency.coordinates),
                    suggestion: Some("Remove the duplicate declaration".to_string()),
                });
            }
        }
    }

    fn validate_publishing(
        config: &PublishConfig,
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        let publishing = &config.publishing;

        for (field, url) in [
            ("publishing.releasesUrl", &publishing.releases_url),
            ("publishing.snapshotsUrl", &publishing.snapshots_url),
        ] {
            if !is_http_url(url) {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "Endpoint must be an http(s) URL".to_string(),
                    expected: Some("https://...".to_string()),
                    actual: Some(url.clone()),
                });
            }
        }

        if publishing.snapshot_marker.is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "publishing.snapshotMarker".to_string(),
                message: "Empty snapshot marker: every version is published as a release"
                    .to_string(),
                suggestion: Some("Use \"SNAPSHOT\"".to_string()),
            });
        }

        let env_names = [
            ("publishing.credentials.usernameEnv", &publishing.credentials.username_env),
            ("publishing.credentials.passwordEnv", &publishing.credentials.password_env),
            ("signing.keyEnv", &config.signing.key_env),
            ("signing.passwordEnv", &config.signing.password_env),
        ];

        for (field, name) in env_names {
            if name.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "Environment variable name is required".to_string(),
                    expected: Some("variable name".to_string()),
                    actual: Some("empty".to_string()),
                });
            }
        }

        if !config.signing.enabled {
            warnings.push(ConfigValidationWarning {
                field: "signing.enabled".to_string(),
                message: "Signing is disabled".to_string(),
                suggestion: Some("Release repositories usually reject unsigned artifacts".to_string()),
            });
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
                if let (Some(expected), Some(actual)) = (&error.expected, &error.actual) {
                    lines.push(format!("    Expected: {}", expected));
                    lines.push(format!("    Actual: {}", actual));
                }
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}
