//! Release Pipeline - Main orchestrator for building and publishing
//!
//! Runs the stages strictly in order:
//! - Validation and secrets scanning
//! - Dependency resolution
//! - Compilation and API documentation
//! - Formatting (apply or check)
//! - Archive assembly and POM generation
//! - Signing
//! - Publication (or a dry-run upload plan)
//!
//! Each stage is recorded in the persisted state machine. A failure marks
//! the run as FAILED with its message and stops the pipeline.

use crate::build::compiler::{collect_java_sources, command_error};
use crate::build::{
    ArtifactKind, ArtifactPackager, ArtifactSet, BuildLayout, DependencyResolver, FormatOutcome,
    JavaToolchain, PomGenerator, SourceFormatter,
};
use crate::core::config::{FormatMode, PublishConfig};
use crate::core::config_loader::{ConfigLoader, CONFIG_FILENAME};
use crate::core::coordinates::{Channel, Coordinates};
use crate::core::error::PublishError;
use crate::core::state_machine::{PipelineState, PipelineStateMachine};
use crate::core::traits::{ArtifactSigner, RepositoryTransport};
use crate::publishing::{route, sign_artifacts, MavenPublisher, PgpSigner, PublicationTarget};
use crate::security::{SafeCommandExecutor, SecretsScanner, SecureCredentialManager};
use crate::validation::{DescriptorValidator, VersionValidator};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Options passed from the command line
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Build and sign, but only report what would be uploaded
    pub dry_run: bool,

    /// Stop after the archives and POM are built
    pub package_only: bool,

    /// Skip the formatting stage
    pub skip_format: bool,

    /// Run formatting in check mode regardless of configuration
    pub check_format: bool,

    /// Publish without signatures (dry runs, snapshots and package-only runs)
    pub skip_signing: bool,
}

/// Result of a pipeline run
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub coordinates: Coordinates,
    pub channel: Channel,
    pub target_url: String,
    /// Archives, POM and signatures produced locally
    pub files: Vec<PathBuf>,
    /// URLs uploaded, or the planned URLs for a dry run
    pub uploaded: Vec<String>,
    pub dry_run: bool,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
    pub final_state: PipelineState,
}

/// Main release pipeline orchestrator
pub struct ReleasePipeline {
    project_path: PathBuf,
    config: PublishConfig,
    layout: BuildLayout,
    transport: Arc<dyn RepositoryTransport>,
    credentials: SecureCredentialManager,
    signer: Option<Arc<dyn ArtifactSigner>>,
    state_machine: PipelineStateMachine,
}

impl ReleasePipeline {
    pub fn new<P: AsRef<Path>>(
        project_path: P,
        config: PublishConfig,
        transport: Arc<dyn RepositoryTransport>,
        credentials: SecureCredentialManager,
    ) -> Self {
        let project_path = project_path.as_ref().to_path_buf();
        Self {
            layout: BuildLayout::new(&project_path, &config),
            state_machine: PipelineStateMachine::new(&project_path),
            project_path,
            config,
            transport,
            credentials,
            signer: None,
        }
    }

    /// Use `signer` instead of loading key material from the environment
    pub fn with_signer(mut self, signer: Arc<dyn ArtifactSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    pub fn state_machine(&self) -> &PipelineStateMachine {
        &self.state_machine
    }

    pub fn coordinates(&self) -> Coordinates {
        let project = &self.config.project;
        Coordinates::new(&project.group, &project.artifact, &project.version)
    }

    /// Endpoint the configured version routes to
    pub fn target(&self) -> PublicationTarget {
        route(&self.config.project.version, &self.config.publishing)
    }

    /// Run every stage
    pub async fn run(&mut self, options: &PipelineOptions) -> Result<PublishReport, PublishError> {
        self.state_machine.clear().await?;
        match self.execute(options).await {
            Ok(report) => Ok(report),
            Err(e) => {
                if let Err(state_error) = self.state_machine.fail(&e.to_string()).await {
                    tracing::warn!(error = %state_error, "failed to record pipeline failure");
                }
                Err(e)
            }
        }
    }

    async fn execute(&mut self, options: &PipelineOptions) -> Result<PublishReport, PublishError> {
        let start_time = Instant::now();
        let target = self.target();
        let coordinates = self.coordinates();

        self.state_machine
            .transition(
                PipelineState::Initial,
                Some(HashMap::from([
                    ("version".to_string(), coordinates.version.clone().into()),
                    ("repository".to_string(), target.repository_name.clone().into()),
                ])),
            )
            .await?;

        // 1. Validation
        println!("🔍 Validating {}...", coordinates);
        let mut warnings = self.preflight(options)?;
        println!("  ✅ Validation successful\n");

        // 2. Dependencies
        self.state_machine
            .transition(PipelineState::Resolving, None)
            .await?;
        println!("📥 Resolving dependencies...");
        let resolver = DependencyResolver::new(
            self.transport.clone(),
            self.config.repositories.clone(),
            &self.layout.dependencies_dir(),
        );
        let resolved = resolver.resolve(&self.config.dependencies).await?;
        println!(
            "  ✅ {} dependencies ({} downloaded)\n",
            resolved.items.len(),
            resolved.downloaded_count()
        );

        // 3. Compilation
        self.state_machine
            .transition(PipelineState::Compiling, None)
            .await?;
        println!("🔨 Compiling...");
        let executor =
            SafeCommandExecutor::new(&self.project_path).map_err(|e| command_error("javac", e))?;
        let sources = collect_java_sources(&self.layout.source_dir)?;
        let classpath = resolved.compile_classpath();
        let toolchain = JavaToolchain::new(&executor, &self.config.java, &self.layout);
        let compiled = toolchain.compile(&sources, &classpath)?;
        toolchain.javadoc(&sources, &classpath)?;
        println!(
            "  ✅ {} sources, {} classes\n",
            compiled.source_count, compiled.class_count
        );

        // 4. Formatting
        if let Some(mode) = self.format_mode(options) {
            self.state_machine
                .transition(PipelineState::Formatting, None)
                .await?;
            println!("🎨 Formatting ({:?})...", mode);
            let outcome = SourceFormatter::new(&executor, &self.config.formatting)
                .run(&sources, mode)?;
            report_formatting(&outcome);
        }

        // 5. Packaging
        self.state_machine
            .transition(PipelineState::Packaging, None)
            .await?;
        println!("📦 Packaging...");
        let artifacts = self.package()?;
        for artifact in &artifacts.artifacts {
            println!("  - {}", artifact.file_name());
        }
        println!();

        let mut files: Vec<PathBuf> = artifacts.paths().map(Path::to_path_buf).collect();

        if options.package_only {
            return self
                .finish(start_time, coordinates, target, files, Vec::new(), warnings, options)
                .await;
        }

        // 6. Signing
        let signed = if self.should_sign(options) {
            self.state_machine
                .transition(PipelineState::Signing, None)
                .await?;
            println!("🔏 Signing...");
            let signatures = self.sign(&artifacts)?;
            println!("  ✅ {} signatures\n", signatures.len());
            files.extend(signatures);
            true
        } else {
            warnings.push("署名をスキップしました".to_string());
            false
        };

        // 7. Publication
        self.state_machine
            .transition(PipelineState::Publishing, None)
            .await?;
        let uploaded = if options.dry_run {
            println!("🧪 Dry run: {} ({})", target.url, target.channel);
            let planned = self.plan(&artifacts, signed);
            for url in &planned {
                println!("  - {}", url);
            }
            println!();
            planned
        } else {
            println!("📤 Publishing to {} ({})...", target.repository_name, target.channel);
            let uploaded = self.publish(&artifacts, signed).await?;
            println!("  ✅ {} files uploaded\n", uploaded.len());
            uploaded
        };

        self.finish(start_time, coordinates, target, files, uploaded, warnings, options)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &mut self,
        start_time: Instant,
        coordinates: Coordinates,
        target: PublicationTarget,
        files: Vec<PathBuf>,
        uploaded: Vec<String>,
        warnings: Vec<String>,
        options: &PipelineOptions,
    ) -> Result<PublishReport, PublishError> {
        self.state_machine
            .transition(PipelineState::Success, None)
            .await?;

        Ok(PublishReport {
            coordinates,
            channel: target.channel,
            target_url: target.url,
            files,
            uploaded,
            dry_run: options.dry_run,
            warnings,
            duration_ms: start_time.elapsed().as_millis() as u64,
            final_state: self.state_machine.get_state(),
        })
    }

    /// Checks made before anything is built
    ///
    /// Configuration and version errors are fatal, as are secrets found in
    /// the configuration file. Descriptor errors are fatal unless only
    /// packaging. Returns the warnings collected.
    pub fn preflight(&self, options: &PipelineOptions) -> Result<Vec<String>, PublishError> {
        let mut warnings = Vec::new();

        let config_result = ConfigLoader::validate(&self.config);
        if !config_result.valid {
            return Err(PublishError::ConfigError(
                ConfigLoader::format_validation_result(&config_result),
            ));
        }
        warnings.extend(
            config_result
                .warnings
                .iter()
                .map(|w| format!("{}: {}", w.field, w.message)),
        );

        VersionValidator::with_marker(&self.config.publishing.snapshot_marker)
            .ensure_valid(&self.config.project.version)?;

        let descriptor = DescriptorValidator::new().validate(&self.config);
        warnings.extend(
            descriptor
                .warnings
                .iter()
                .map(|w| format!("{}: {}", w.field, w.message)),
        );
        if let Some(error) = descriptor.errors.first() {
            if !options.package_only {
                for error in &descriptor.errors {
                    println!("    - [{}] {}", error.field, error.message);
                }
                return Err(PublishError::MissingMetadata {
                    field: error.field.clone(),
                });
            }
            warnings.extend(
                descriptor
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message)),
            );
        }

        // releases are never uploaded unsigned
        if !self.should_sign(options)
            && !options.dry_run
            && !options.package_only
            && self.target().channel == Channel::Release
        {
            let reason = if options.skip_signing {
                "--skip-signing"
            } else {
                "signing.enabled: false"
            };
            return Err(PublishError::ConfigError(format!(
                "{} はドライランまたはスナップショットでのみ使用できます",
                reason
            )));
        }

        warnings.extend(self.scan_secrets()?);

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        Ok(warnings)
    }

    /// Secrets in the configuration file are fatal, in sources a warning
    fn scan_secrets(&self) -> Result<Vec<String>, PublishError> {
        let scanning = &self.config.security.secrets_scanning;
        if !scanning.enabled {
            return Ok(Vec::new());
        }

        let mut scanner = SecretsScanner::new();
        scanner.configure(&scanning.ignore_patterns);

        let config_file = self.project_path.join(CONFIG_FILENAME);
        if config_file.is_file() {
            let report = scanner.scan_file(&config_file)?;
            if report.has_secrets {
                for finding in &report.findings {
                    println!(
                        "  ❌ {} ({}:{}) {}",
                        finding.secret_type,
                        finding.file.display(),
                        finding.line,
                        finding.matched
                    );
                }
                return Err(PublishError::SecretsDetected {
                    count: report.findings.len(),
                });
            }
        }

        let report = scanner.scan_project(&self.layout.source_dir)?;
        Ok(report
            .findings
            .iter()
            .map(|f| {
                format!(
                    "{}:{}: 機密情報の可能性があります ({})",
                    f.file.display(),
                    f.line,
                    f.secret_type
                )
            })
            .collect())
    }

    fn format_mode(&self, options: &PipelineOptions) -> Option<FormatMode> {
        if options.skip_format || !self.config.formatting.enabled {
            return None;
        }
        if options.check_format {
            Some(FormatMode::Check)
        } else {
            Some(self.config.formatting.mode)
        }
    }

    fn should_sign(&self, options: &PipelineOptions) -> bool {
        self.config.signing.enabled && !options.skip_signing
    }

    /// Build the three archives and the POM
    pub fn package(&self) -> Result<ArtifactSet, PublishError> {
        let mut artifacts = ArtifactPackager::new(&self.config, &self.layout).package()?;
        let pom = PomGenerator::new(&self.config).write(&self.layout.publications_dir())?;
        artifacts.push(ArtifactKind::Pom, pom);
        Ok(artifacts)
    }

    /// Sign every publication file
    ///
    /// Key material is loaded here, not earlier, so a missing key fails
    /// only this stage and leaves the archives in place.
    pub fn sign(&self, artifacts: &ArtifactSet) -> Result<Vec<PathBuf>, PublishError> {
        let signer: Arc<dyn ArtifactSigner> = match &self.signer {
            Some(signer) => signer.clone(),
            None => {
                let material = self.credentials.signing_material(&self.config.signing)?;
                Arc::new(PgpSigner::from_material(&material)?)
            }
        };
        sign_artifacts(signer.as_ref(), artifacts)
    }

    /// URLs a publication would upload, without any network access
    pub fn plan(&self, artifacts: &ArtifactSet, signed: bool) -> Vec<String> {
        MavenPublisher::new(self.transport.clone(), self.target(), signed)
            .plan(artifacts)
            .into_iter()
            .map(|upload| upload.url)
            .collect()
    }

    /// Upload a built publication
    ///
    /// Credentials are checked before the first request.
    pub async fn publish(
        &self,
        artifacts: &ArtifactSet,
        signed: bool,
    ) -> Result<Vec<String>, PublishError> {
        let credentials = self
            .credentials
            .upload_credentials(&self.config.publishing.credentials)?;
        let publisher = MavenPublisher::new(self.transport.clone(), self.target(), signed);
        let outcome = publisher.publish(artifacts, &credentials).await?;
        Ok(outcome.uploaded)
    }
}

fn report_formatting(outcome: &FormatOutcome) {
    match outcome.mode {
        FormatMode::Apply if !outcome.changed.is_empty() => {
            println!("  ✏️  {} files reformatted", outcome.changed.len());
            for path in &outcome.changed {
                println!("    - {}", path.display());
            }
            println!();
        }
        _ => println!("  ✅ {} files checked\n", outcome.files_checked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::packaging::Artifact;
    use crate::publishing::{parse_public_key, signature_path, verify_signature};
    use crate::testing::{MemoryTransport, SIGNING_KEY, SIGNING_PASSPHRASE, SIGNING_PUBLIC_KEY};
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
version: "1.0"
project:
  group: com.deepl.api
  artifact: deepl-java
  version: 1.3.0
  name: deepl-java
  description: DeepL API Java Client Library
  url: https://www.github.com/DeepLcom/deepl-java
dependencies:
  - coordinates: com.google.code.gson:gson:2.9.0
    scope: implementation
pom:
  licenses:
    - name: MIT License
      url: https://www.opensource.org/licenses/mit-license.php
  developers:
    - id: deepl
      name: DeepL SE
      email: open-source@deepl.com
  organization:
    name: DeepL SE
    url: https://www.deepl.com
  scm:
    connection: scm:git:git://github.com/DeepLcom/deepl-java.git
    developerConnection: scm:git:ssh://github.com/DeepLcom/deepl-java.git
    url: https://www.github.com/DeepLcom/deepl-java
publishing:
  releasesUrl: https://repo.example.com/releases
  snapshotsUrl: https://repo.example.com/snapshots
"#;

    fn config(version: &str) -> PublishConfig {
        let mut config = ConfigLoader::from_yaml(CONFIG).unwrap();
        config.project.version = version.to_string();
        config
    }

    fn credentials() -> SecureCredentialManager {
        SecureCredentialManager::with_env(HashMap::from([
            ("MAVEN_UPLOAD_USERNAME".to_string(), "deepl".to_string()),
            ("MAVEN_UPLOAD_PASSWORD".to_string(), "upload-password".to_string()),
        ]))
    }

    fn pipeline(dir: &Path, version: &str, transport: Arc<MemoryTransport>) -> ReleasePipeline {
        ReleasePipeline::new(dir, config(version), transport, credentials())
    }

    /// Archives as the packaging stage leaves them
    fn built_artifacts(dir: &Path, version: &str) -> ArtifactSet {
        let coordinates = Coordinates::new("com.deepl.api", "deepl-java", version);
        let artifacts = [
            ArtifactKind::Primary,
            ArtifactKind::Sources,
            ArtifactKind::Javadoc,
            ArtifactKind::Pom,
        ]
        .into_iter()
        .map(|kind| {
            let path = dir.join(coordinates.file_name(kind.classifier(), kind.extension()));
            fs::write(&path, format!("{} {}", kind, version)).unwrap();
            Artifact { kind, path }
        })
        .collect();
        ArtifactSet {
            coordinates,
            artifacts,
        }
    }

    #[test]
    fn test_version_routes_target() {
        let temp_dir = TempDir::new().unwrap();
        let transport = Arc::new(MemoryTransport::default());

        let release = pipeline(temp_dir.path(), "1.3.0", transport.clone());
        let snapshot = pipeline(temp_dir.path(), "1.3.0-SNAPSHOT", transport);

        assert_eq!(release.target().url, "https://repo.example.com/releases");
        assert_eq!(snapshot.target().url, "https://repo.example.com/snapshots");
    }

    #[test]
    fn test_preflight_passes_for_complete_config() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = pipeline(temp_dir.path(), "1.3.0", Arc::new(MemoryTransport::default()));

        let warnings = pipeline.preflight(&PipelineOptions::default()).unwrap();

        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_preflight_rejects_missing_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config("1.3.0");
        config.pom.licenses.clear();
        let pipeline = ReleasePipeline::new(
            temp_dir.path(),
            config,
            Arc::new(MemoryTransport::default()),
            credentials(),
        );

        let result = pipeline.preflight(&PipelineOptions::default());
        assert!(matches!(result, Err(PublishError::MissingMetadata { .. })));

        let package_only = PipelineOptions {
            package_only: true,
            ..PipelineOptions::default()
        };
        let warnings = pipeline.preflight(&package_only).unwrap();
        assert!(warnings.iter().any(|w| w.starts_with("pom.licenses")));
    }

    #[test]
    fn test_preflight_rejects_invalid_version() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = pipeline(temp_dir.path(), "1.3.0 beta", Arc::new(MemoryTransport::default()));

        let result = pipeline.preflight(&PipelineOptions::default());

        assert!(matches!(result, Err(PublishError::InvalidVersion { .. })));
    }

    #[test]
    fn test_skip_signing_only_for_snapshot_or_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let transport = Arc::new(MemoryTransport::default());
        let skip = PipelineOptions {
            skip_signing: true,
            ..PipelineOptions::default()
        };

        let release = pipeline(temp_dir.path(), "1.3.0", transport.clone());
        assert!(matches!(
            release.preflight(&skip),
            Err(PublishError::ConfigError(_))
        ));

        let dry_run = PipelineOptions {
            dry_run: true,
            ..skip.clone()
        };
        assert!(release.preflight(&dry_run).is_ok());

        let snapshot = pipeline(temp_dir.path(), "1.3.0-SNAPSHOT", transport);
        assert!(snapshot.preflight(&skip).is_ok());
    }

    #[test]
    fn test_signing_disabled_in_config_blocks_release() {
        let temp_dir = TempDir::new().unwrap();
        let transport = Arc::new(MemoryTransport::default());
        let unsigned = |version: &str| {
            let mut config = config(version);
            config.signing.enabled = false;
            ReleasePipeline::new(temp_dir.path(), config, transport.clone(), credentials())
        };

        let release = unsigned("1.3.0");
        match release.preflight(&PipelineOptions::default()) {
            Err(PublishError::ConfigError(message)) => {
                assert!(message.contains("signing.enabled"))
            }
            other => panic!("Expected ConfigError, got {:?}", other),
        }

        let dry_run = PipelineOptions {
            dry_run: true,
            ..PipelineOptions::default()
        };
        assert!(release.preflight(&dry_run).is_ok());

        let package_only = PipelineOptions {
            package_only: true,
            ..PipelineOptions::default()
        };
        assert!(release.preflight(&package_only).is_ok());

        assert!(unsigned("1.3.0-SNAPSHOT")
            .preflight(&PipelineOptions::default())
            .is_ok());
    }

    #[tokio::test]
    async fn test_unsigned_release_run_uploads_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let transport = Arc::new(MemoryTransport::default());
        let mut config = config("1.3.0");
        config.signing.enabled = false;
        let mut pipeline =
            ReleasePipeline::new(temp_dir.path(), config, transport.clone(), credentials());

        let result = pipeline.run(&PipelineOptions::default()).await;

        assert!(matches!(result, Err(PublishError::ConfigError(_))));
        assert!(transport.uploaded().is_empty());
        assert!(transport.fetched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_secret_in_config_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            format!("{}\n# password: \"hunter2hunter2\"\n", CONFIG),
        )
        .unwrap();
        let pipeline = pipeline(temp_dir.path(), "1.3.0", Arc::new(MemoryTransport::default()));

        let result = pipeline.preflight(&PipelineOptions::default());

        assert!(matches!(result, Err(PublishError::SecretsDetected { count: 1 })));
    }

    #[test]
    fn test_secret_in_sources_is_warning() {
        let temp_dir = TempDir::new().unwrap();
        let source_dir = temp_dir.path().join("src/main/java/com/deepl/api");
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(
            source_dir.join("Fixture.java"),
            "class Fixture { String password = \"hunter2hunter2\"; }\n",
        )
        .unwrap();
        let pipeline = pipeline(temp_dir.path(), "1.3.0", Arc::new(MemoryTransport::default()));

        let warnings = pipeline.preflight(&PipelineOptions::default()).unwrap();

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Fixture.java"));
    }

    #[tokio::test]
    async fn test_unresolvable_dependency_fails_before_compilation() {
        let temp_dir = TempDir::new().unwrap();
        let mut pipeline = pipeline(temp_dir.path(), "1.3.0", Arc::new(MemoryTransport::default()));

        let result = pipeline.run(&PipelineOptions::default()).await;

        assert!(matches!(
            result,
            Err(PublishError::DependencyResolution { .. })
        ));
        assert_eq!(pipeline.state_machine().get_state(), PipelineState::Failed);
        assert!(pipeline.state_machine().get_last_error().is_some());
        assert!(!pipeline.layout().classes_dir().exists());
    }

    #[tokio::test]
    async fn test_missing_sources_fail_compilation() {
        let temp_dir = TempDir::new().unwrap();
        let gson = "https://repo.maven.apache.org/maven2/com/google/code/gson/gson/2.9.0/gson-2.9.0.jar";
        let transport = Arc::new(MemoryTransport::default().with_file(gson, b"PK"));
        let mut pipeline = pipeline(temp_dir.path(), "1.3.0", transport);

        let result = pipeline.run(&PipelineOptions::default()).await;

        assert!(matches!(result, Err(PublishError::CompilationFailed { .. })));
        assert!(pipeline
            .layout()
            .dependencies_dir()
            .join("com/google/code/gson/gson/2.9.0/gson-2.9.0.jar")
            .exists());
        let history = pipeline.state_machine().get_history();
        assert!(history.contains("RESOLVING"));
        assert!(history.contains("COMPILING"));
    }

    #[test]
    fn test_sign_every_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let signer = PgpSigner::from_armored(SIGNING_KEY, SIGNING_PASSPHRASE).unwrap();
        let key = parse_public_key(SIGNING_PUBLIC_KEY).unwrap();
        let pipeline = pipeline(temp_dir.path(), "1.3.0", Arc::new(MemoryTransport::default()))
            .with_signer(Arc::new(signer));
        let artifacts = built_artifacts(temp_dir.path(), "1.3.0");

        let signatures = pipeline.sign(&artifacts).unwrap();

        assert_eq!(signatures.len(), 4);
        for artifact in &artifacts.artifacts {
            let data = fs::read(&artifact.path).unwrap();
            let signature = fs::read_to_string(signature_path(&artifact.path)).unwrap();
            assert!(verify_signature(&key, &data, &signature).unwrap());
        }
    }

    #[test]
    fn test_sign_with_key_from_environment() {
        let temp_dir = TempDir::new().unwrap();
        let credentials = SecureCredentialManager::with_env(HashMap::from([
            ("SIGNING_KEY".to_string(), SIGNING_KEY.to_string()),
            ("SIGNING_PASSWORD".to_string(), SIGNING_PASSPHRASE.to_string()),
        ]));
        let pipeline = ReleasePipeline::new(
            temp_dir.path(),
            config("1.3.0"),
            Arc::new(MemoryTransport::default()),
            credentials,
        );
        let artifacts = built_artifacts(temp_dir.path(), "1.3.0");
        let key = parse_public_key(SIGNING_PUBLIC_KEY).unwrap();

        pipeline.sign(&artifacts).unwrap();

        let pom = &artifacts.get(ArtifactKind::Pom).unwrap().path;
        let signature = fs::read_to_string(signature_path(pom)).unwrap();
        assert!(signature.starts_with("-----BEGIN PGP SIGNATURE-----"));
        assert!(verify_signature(&key, &fs::read(pom).unwrap(), &signature).unwrap());
    }

    #[test]
    fn test_wrong_signing_password_writes_no_signature() {
        let temp_dir = TempDir::new().unwrap();
        let credentials = SecureCredentialManager::with_env(HashMap::from([
            ("SIGNING_KEY".to_string(), SIGNING_KEY.to_string()),
            ("SIGNING_PASSWORD".to_string(), "wrong".to_string()),
        ]));
        let pipeline = ReleasePipeline::new(
            temp_dir.path(),
            config("1.3.0"),
            Arc::new(MemoryTransport::default()),
            credentials,
        );
        let artifacts = built_artifacts(temp_dir.path(), "1.3.0");

        let result = pipeline.sign(&artifacts);

        assert!(matches!(result, Err(PublishError::InvalidPassphrase)));
        assert!(artifacts.paths().all(|p| !signature_path(p).exists()));
    }

    #[test]
    fn test_missing_signing_key_writes_no_signature() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = pipeline(temp_dir.path(), "1.3.0", Arc::new(MemoryTransport::default()));
        let artifacts = built_artifacts(temp_dir.path(), "1.3.0");

        let result = pipeline.sign(&artifacts);

        assert!(matches!(result, Err(PublishError::SigningKeyMissing { .. })));
        assert!(result.unwrap_err().leaves_artifacts());
        assert!(artifacts.paths().all(|p| p.exists() && !signature_path(p).exists()));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_upload() {
        let temp_dir = TempDir::new().unwrap();
        let transport = Arc::new(MemoryTransport::default());
        let pipeline = ReleasePipeline::new(
            temp_dir.path(),
            config("1.3.0"),
            transport.clone(),
            SecureCredentialManager::with_env(HashMap::new()),
        );
        let artifacts = built_artifacts(temp_dir.path(), "1.3.0");

        let result = pipeline.publish(&artifacts, false).await;

        assert!(matches!(result, Err(PublishError::CredentialsMissing { .. })));
        assert!(transport.uploaded().is_empty());
        assert!(transport.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let transport = Arc::new(MemoryTransport::default());
        let pipeline = pipeline(temp_dir.path(), "1.3.0-SNAPSHOT", transport.clone());
        let artifacts = built_artifacts(temp_dir.path(), "1.3.0-SNAPSHOT");

        let uploaded = pipeline.publish(&artifacts, false).await.unwrap();

        assert_eq!(uploaded, pipeline.plan(&artifacts, false));
        assert!(uploaded.iter().all(|url| url.starts_with("https://repo.example.com/snapshots/")));
        assert!(uploaded
            .iter()
            .any(|url| url.ends_with("1.3.0-SNAPSHOT/deepl-java-1.3.0-SNAPSHOT-javadoc.jar")));
    }
}
