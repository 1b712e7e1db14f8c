//! Descriptor Validator - Checks the publication metadata against the
//! requirements of Maven Central
//!
//! A release is rejected by the repository unless the POM carries a name,
//! description, project URL, license, developer and SCM information. This
//! validator finds those gaps before anything is built.
//!
//! # Example
//!
//! ```
//! use maven_publisher::core::PublishConfig;
//! use maven_publisher::validation::DescriptorValidator;
//!
//! let result = DescriptorValidator::new().validate(&PublishConfig::default());
//! assert!(!result.valid);
//! ```

use crate::core::config::PublishConfig;
use crate::core::traits::{ValidationError, ValidationResult, ValidationWarning};
use std::collections::HashMap;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Dot-separated segments, none of them empty
fn is_valid_group(group: &str) -> bool {
    group
        .split('.')
        .all(|segment| !segment.is_empty() && segment.chars().all(is_id_char))
}

fn is_valid_artifact(artifact: &str) -> bool {
    !artifact.is_empty() && artifact.chars().all(|c| is_id_char(c) || c == '.')
}

/// Validator for the publication descriptor
#[derive(Default)]
pub struct DescriptorValidator;

impl DescriptorValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, config: &PublishConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let project = &config.project;
        let pom = &config.pom;

        if !is_valid_group(&project.group) {
            errors.push(ValidationError::new(
                "project.group",
                format!("グループIDの形式が不正です: {:?}", project.group),
            ));
        }
        if !is_valid_artifact(&project.artifact) {
            errors.push(ValidationError::new(
                "project.artifact",
                format!("アーティファクトIDの形式が不正です: {:?}", project.artifact),
            ));
        }

        for (field, value) in [
            ("project.name", &project.name),
            ("project.description", &project.description),
            ("project.url", &project.url),
        ] {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                errors.push(ValidationError::new(field, format!("{} は必須です", field)));
            }
        }

        if pom.licenses.is_empty() {
            errors.push(ValidationError::new(
                "pom.licenses",
                "ライセンスを1件以上指定してください",
            ));
        }
        for (i, license) in pom.licenses.iter().enumerate() {
            if license.name.trim().is_empty() || license.url.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("pom.licenses[{}]", i),
                    "ライセンスには name と url が必要です",
                ));
            }
        }

        if pom.developers.is_empty() {
            errors.push(ValidationError::new(
                "pom.developers",
                "開発者を1件以上指定してください",
            ));
        }
        for (i, developer) in pom.developers.iter().enumerate() {
            if developer.id.trim().is_empty() && developer.name.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("pom.developers[{}]", i),
                    "開発者には id または name が必要です",
                ));
            }
            if developer.email.is_none() {
                warnings.push(ValidationWarning::new(
                    format!("pom.developers[{}].email", i),
                    "開発者のメールアドレスが指定されていません",
                ));
            }
        }

        match &pom.scm {
            None => errors.push(ValidationError::new("pom.scm", "SCM 情報は必須です")),
            Some(scm) => {
                if scm.url.trim().is_empty() {
                    errors.push(ValidationError::new("pom.scm.url", "pom.scm.url は必須です"));
                }
                if scm.connection.trim().is_empty() {
                    errors.push(ValidationError::new(
                        "pom.scm.connection",
                        "pom.scm.connection は必須です",
                    ));
                }
            }
        }

        if pom.organization.is_none() {
            warnings.push(ValidationWarning::new(
                "pom.organization",
                "組織情報が指定されていません",
            ));
        }

        let mut result = ValidationResult::from_findings(errors, warnings);
        result.metadata = Some(HashMap::from([
            (
                "coordinates".to_string(),
                serde_json::Value::String(format!(
                    "{}:{}:{}",
                    project.group, project.artifact, project.version
                )),
            ),
            (
                "licenses".to_string(),
                serde_json::Value::from(pom.licenses.len()),
            ),
        ]));
        result
    }
}
