//! Publication routing and upload to a Maven repository
//!
//! The endpoint is chosen from the version string alone. Every file is
//! checked and read before the first request so that a missing file or
//! signature never produces a half-published version.

use super::metadata::{MavenMetadata, METADATA_FILE};
use super::signing::signature_path;
use crate::build::packaging::ArtifactSet;
use crate::core::config::PublishingConfig;
use crate::core::coordinates::{join_url, Channel, Coordinates};
use crate::core::error::PublishError;
use crate::core::traits::RepositoryTransport;
use crate::security::UploadCredentials;
use chrono::Utc;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Checksum files uploaded next to every published file
pub const CHECKSUM_EXTENSIONS: [&str; 4] = ["md5", "sha1", "sha256", "sha512"];

/// Endpoint a version is published to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationTarget {
    pub repository_name: String,
    pub channel: Channel,
    pub url: String,
}

/// Select the release or snapshot endpoint for `version`
///
/// # Examples
///
/// ```
/// use maven_publisher::core::{Channel, PublishingConfig};
/// use maven_publisher::publishing::route;
///
/// let config = PublishingConfig::default();
/// assert_eq!(route("1.3.0-SNAPSHOT", &config).channel, Channel::Snapshot);
/// assert_eq!(route("1.3.0", &config).url, config.releases_url);
/// ```
pub fn route(version: &str, config: &PublishingConfig) -> PublicationTarget {
    let channel = Channel::for_version(version, &config.snapshot_marker);
    let url = match channel {
        Channel::Release => config.releases_url.clone(),
        Channel::Snapshot => config.snapshots_url.clone(),
    };
    PublicationTarget {
        repository_name: config.repository_name.clone(),
        channel,
        url,
    }
}

pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

pub fn sha1_hex(data: &[u8]) -> String {
    format!("{:x}", Sha1::digest(data))
}

pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

pub fn sha512_hex(data: &[u8]) -> String {
    format!("{:x}", Sha512::digest(data))
}

fn checksum(extension: &str, data: &[u8]) -> String {
    match extension {
        "md5" => md5_hex(data),
        "sha1" => sha1_hex(data),
        "sha512" => sha512_hex(data),
        _ => sha256_hex(data),
    }
}

/// Where an upload's body comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    File(PathBuf),
    Checksum { of: PathBuf, algorithm: &'static str },
    Metadata,
    MetadataChecksum { algorithm: &'static str },
}

/// One request of a publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub url: String,
    pub source: UploadSource,
}

/// Result of a completed publication
#[derive(Debug, Clone, Default)]
pub struct PublishOutcome {
    pub uploaded: Vec<String>,
}

/// Uploads an [`ArtifactSet`] in Maven layout
pub struct MavenPublisher {
    transport: Arc<dyn RepositoryTransport>,
    target: PublicationTarget,
    sign: bool,
}

impl MavenPublisher {
    pub fn new(transport: Arc<dyn RepositoryTransport>, target: PublicationTarget, sign: bool) -> Self {
        Self {
            transport,
            target,
            sign,
        }
    }

    pub fn target(&self) -> &PublicationTarget {
        &self.target
    }

    fn version_url(&self, coordinates: &Coordinates, file_name: &str) -> String {
        join_url(
            &self.target.url,
            &format!("{}/{}", coordinates.version_path(), file_name),
        )
    }

    fn metadata_url(&self, coordinates: &Coordinates) -> String {
        join_url(
            &self.target.url,
            &format!("{}/{}", coordinates.artifact_path(), METADATA_FILE),
        )
    }

    /// Every request a publication makes, in order
    ///
    /// Each file is followed by its signature (when signing) and its
    /// checksums. The artifact-level metadata and its checksums come last.
    pub fn plan(&self, artifacts: &ArtifactSet) -> Vec<PlannedUpload> {
        let coordinates = &artifacts.coordinates;
        let mut plan = Vec::new();

        for artifact in &artifacts.artifacts {
            let mut files = vec![artifact.path.clone()];
            if self.sign {
                files.push(signature_path(&artifact.path));
            }
            for file in files {
                let name = file_name(&file);
                plan.push(PlannedUpload {
                    url: self.version_url(coordinates, &name),
                    source: UploadSource::File(file.clone()),
                });
                for algorithm in CHECKSUM_EXTENSIONS {
                    plan.push(PlannedUpload {
                        url: self.version_url(coordinates, &format!("{}.{}", name, algorithm)),
                        source: UploadSource::Checksum {
                            of: file.clone(),
                            algorithm,
                        },
                    });
                }
            }
        }

        let metadata_url = self.metadata_url(coordinates);
        plan.push(PlannedUpload {
            url: metadata_url.clone(),
            source: UploadSource::Metadata,
        });
        for algorithm in CHECKSUM_EXTENSIONS {
            plan.push(PlannedUpload {
                url: format!("{}.{}", metadata_url, algorithm),
                source: UploadSource::MetadataChecksum { algorithm },
            });
        }
        plan
    }

    /// Check every local file exists before anything is sent
    pub fn preflight(&self, artifacts: &ArtifactSet) -> Result<(), PublishError> {
        if artifacts.artifacts.is_empty() {
            return Err(PublishError::UploadFailed {
                url: self.target.url.clone(),
                message: "公開するアーティファクトがありません".to_string(),
            });
        }

        for artifact in &artifacts.artifacts {
            if !artifact.path.is_file() {
                return Err(PublishError::UploadFailed {
                    url: self.target.url.clone(),
                    message: format!("ファイルが見つかりません: {}", artifact.path.display()),
                });
            }
            if self.sign {
                let signature = signature_path(&artifact.path);
                if !signature.is_file() {
                    return Err(PublishError::SigningFailed {
                        message: format!("署名ファイルが見つかりません: {}", signature.display()),
                    });
                }
            }
        }
        Ok(())
    }

    /// Upload every file, then merge and upload `maven-metadata.xml`
    ///
    /// Stops at the first rejected request.
    pub async fn publish(
        &self,
        artifacts: &ArtifactSet,
        credentials: &UploadCredentials,
    ) -> Result<PublishOutcome, PublishError> {
        self.preflight(artifacts)?;

        let plan = self.plan(artifacts);
        let mut bodies = Vec::with_capacity(plan.len());
        for upload in &plan {
            let body = match &upload.source {
                UploadSource::File(path) => Some(tokio::fs::read(path).await?),
                UploadSource::Checksum { of, algorithm } => {
                    Some(checksum(algorithm, &tokio::fs::read(of).await?).into_bytes())
                }
                UploadSource::Metadata | UploadSource::MetadataChecksum { .. } => None,
            };
            bodies.push(body);
        }

        let coordinates = &artifacts.coordinates;
        let mut outcome = PublishOutcome::default();
        let mut metadata: Vec<u8> = Vec::new();

        for (upload, body) in plan.iter().zip(bodies) {
            let body = match (&upload.source, body) {
                (_, Some(body)) => body,
                (UploadSource::MetadataChecksum { algorithm }, None) => {
                    checksum(algorithm, &metadata).into_bytes()
                }
                // metadata is merged only once every file went through
                (_, None) => {
                    metadata = self.merged_metadata(coordinates, credentials).await?;
                    metadata.clone()
                }
            };

            self.transport.upload(&upload.url, body, credentials).await?;
            tracing::debug!(url = %upload.url, "uploaded");
            outcome.uploaded.push(upload.url.clone());
        }

        tracing::info!(
            repository = %self.target.repository_name,
            count = outcome.uploaded.len(),
            "publication uploaded"
        );
        Ok(outcome)
    }

    async fn merged_metadata(
        &self,
        coordinates: &Coordinates,
        credentials: &UploadCredentials,
    ) -> Result<Vec<u8>, PublishError> {
        let url = self.metadata_url(coordinates);
        let mut metadata = match self.transport.fetch(&url, Some(credentials)).await? {
            Some(existing) => {
                MavenMetadata::parse(coordinates, &String::from_utf8_lossy(&existing)).map_err(
                    |e| match e {
                        PublishError::UploadFailed { message, .. } => PublishError::UploadFailed {
                            url: url.clone(),
                            message,
                        },
                        other => other,
                    },
                )?
            }
            None => MavenMetadata::new(coordinates),
        };
        metadata.add_version(&coordinates.version, self.target.channel, Utc::now());
        Ok(metadata.render().into_bytes())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
