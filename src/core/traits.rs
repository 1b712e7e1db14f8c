//! Core traits and types for the release pipeline
//!
//! This module defines the seams the pipeline talks through: the network
//! ([`RepositoryTransport`]) and artifact signatures ([`ArtifactSigner`]),
//! plus the validation result types shared by the validators.

use super::error::PublishError;
use crate::security::UploadCredentials;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Validation
// ============================================================================

/// Validation error with field information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(default = "default_error_severity")]
    pub severity: String, // Always "error"
}

fn default_error_severity() -> String {
    "error".to_string()
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: default_error_severity(),
        }
    }
}

/// Validation warning with field information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    #[serde(default = "default_warning_severity")]
    pub severity: String, // Always "warning"
}

fn default_warning_severity() -> String {
    "warning".to_string()
}

impl ValidationWarning {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: default_warning_severity(),
        }
    }
}

/// Result of a validation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl ValidationResult {
    /// Build a result whose validity follows from the error list
    pub fn from_findings(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            metadata: None,
        }
    }
}

// ============================================================================
// Repository Transport
// ============================================================================

/// Network access to Maven repositories
///
/// The HTTP implementation lives in `publishing::repository`; tests plug in
/// an in-memory double.
#[async_trait]
pub trait RepositoryTransport: Send + Sync {
    /// Fetch the resource at `url`.
    ///
    /// Returns `Ok(None)` when the repository answers 404.
    async fn fetch(
        &self,
        url: &str,
        credentials: Option<&UploadCredentials>,
    ) -> Result<Option<Vec<u8>>, PublishError>;

    /// Store `body` at `url`.
    ///
    /// A 401/403 answer must surface as [`PublishError::AuthenticationFailed`].
    async fn upload(
        &self,
        url: &str,
        body: Vec<u8>,
        credentials: &UploadCredentials,
    ) -> Result<(), PublishError>;
}

// ============================================================================
// Artifact Signer
// ============================================================================

/// Produces detached signatures for publication files
pub trait ArtifactSigner: Send + Sync {
    /// Short identifier of the signing key, shown in progress output
    fn key_id(&self) -> String;

    /// ASCII-armored detached signature over `data`
    fn sign(&self, data: &[u8]) -> Result<String, PublishError>;
}
