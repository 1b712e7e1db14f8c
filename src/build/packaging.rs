//! Archive assembly for the primary, sources and javadoc jars
//!
//! All three archives are written into a private staging directory first.
//! Only when every archive was built and its manifest read back do they move
//! into `build/libs`, so a release never ends up with archives of mixed
//! versions.

use super::manifest::{Manifest, MANIFEST_PATH};
use super::BuildLayout;
use crate::core::config::PublishConfig;
use crate::core::coordinates::Coordinates;
use crate::core::error::PublishError;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Kind of publication file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Primary,
    Sources,
    Javadoc,
    Pom,
}

impl ArtifactKind {
    pub fn classifier(&self) -> Option<&'static str> {
        match self {
            Self::Primary | Self::Pom => None,
            Self::Sources => Some("sources"),
            Self::Javadoc => Some("javadoc"),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pom => "pom",
            _ => "jar",
        }
    }

    /// Archive kinds in build order
    pub fn archives() -> [ArtifactKind; 3] {
        [Self::Primary, Self::Sources, Self::Javadoc]
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::Sources => "sources",
            Self::Javadoc => "javadoc",
            Self::Pom => "pom",
        };
        f.write_str(name)
    }
}

/// A publication file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Every file published for one set of coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub coordinates: Coordinates,
    pub artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    pub fn push(&mut self, kind: ArtifactKind, path: PathBuf) {
        self.artifacts.retain(|a| a.kind != kind);
        self.artifacts.push(Artifact { kind, path });
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.artifacts.iter().map(|a| a.path.as_path())
    }
}

/// Builds the three release archives
pub struct ArtifactPackager<'a> {
    config: &'a PublishConfig,
    layout: &'a BuildLayout,
}

impl<'a> ArtifactPackager<'a> {
    pub fn new(config: &'a PublishConfig, layout: &'a BuildLayout) -> Self {
        Self { config, layout }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(
            &self.config.project.group,
            &self.config.project.artifact,
            &self.config.project.version,
        )
    }

    /// Shared manifest of every archive
    pub fn manifest(&self) -> Manifest {
        Manifest::for_release(
            &self.config.manifest.implementation_title,
            &self.config.project.version,
            &self.config.manifest.attributes,
        )
    }

    /// Build all three archives into `build/libs`
    pub fn package(&self) -> Result<ArtifactSet, PublishError> {
        let coordinates = self.coordinates();
        let staging = self
            .layout
            .tmp_dir()
            .join(format!("packaging-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&staging)?;

        let result = self.build_in(&staging, &coordinates);
        let result = result.and_then(|staged| self.promote(staged, &coordinates));

        if let Err(e) = fs::remove_dir_all(&staging) {
            tracing::warn!("failed to remove staging directory {}: {}", staging.display(), e);
        }

        result
    }

    fn build_in(
        &self,
        staging: &Path,
        coordinates: &Coordinates,
    ) -> Result<Vec<(ArtifactKind, PathBuf)>, PublishError> {
        let manifest = self.manifest();
        let mut staged = Vec::new();

        for kind in ArtifactKind::archives() {
            let file_name = coordinates.file_name(kind.classifier(), kind.extension());
            let path = staging.join(&file_name);
            let entries = self.entries_for(kind)?;

            write_archive(&path, &manifest, &entries).map_err(|message| {
                PublishError::PackagingFailed {
                    artifact: file_name.clone(),
                    message,
                }
            })?;
            tracing::debug!(%file_name, entries = entries.len(), "archive written");
            staged.push((kind, path));
        }

        verify_versions(
            &coordinates.version,
            staged.iter().map(|(_, path)| path.as_path()),
        )?;

        Ok(staged)
    }

    /// Move staged archives into `build/libs`, undoing partial moves on failure
    fn promote(
        &self,
        staged: Vec<(ArtifactKind, PathBuf)>,
        coordinates: &Coordinates,
    ) -> Result<ArtifactSet, PublishError> {
        let libs_dir = self.layout.libs_dir();
        fs::create_dir_all(&libs_dir)?;

        let mut set = ArtifactSet {
            coordinates: coordinates.clone(),
            artifacts: Vec::new(),
        };

        for (kind, staged_path) in staged {
            let target = libs_dir.join(staged_path.file_name().unwrap_or_default());
            if let Err(e) = fs::rename(&staged_path, &target) {
                for artifact in &set.artifacts {
                    let _ = fs::remove_file(&artifact.path);
                }
                return Err(PublishError::PackagingFailed {
                    artifact: target.display().to_string(),
                    message: e.to_string(),
                });
            }
            set.push(kind, target);
        }

        tracing::info!(version = %coordinates.version, "archives assembled");
        Ok(set)
    }

    /// Archive entry name → source file, sorted by entry name
    fn entries_for(&self, kind: ArtifactKind) -> Result<BTreeMap<String, PathBuf>, PublishError> {
        let mut entries = BTreeMap::new();

        match kind {
            ArtifactKind::Primary => {
                collect_tree(&self.layout.classes_dir(), &mut entries, |_| true)?;
                if self.layout.resources_dir.is_dir() {
                    collect_tree(&self.layout.resources_dir, &mut entries, |_| true)?;
                }
            }
            ArtifactKind::Sources => {
                collect_tree(&self.layout.source_dir, &mut entries, |p| {
                    p.extension().is_some_and(|ext| ext == "java")
                })?;
            }
            ArtifactKind::Javadoc => {
                collect_tree(&self.layout.javadoc_dir(), &mut entries, |_| true)?;
            }
            ArtifactKind::Pom => {}
        }

        // the manifest is always generated, never copied
        entries.remove(MANIFEST_PATH);
        Ok(entries)
    }
}

fn collect_tree(
    root: &Path,
    entries: &mut BTreeMap<String, PathBuf>,
    include: impl Fn(&Path) -> bool,
) -> Result<(), PublishError> {
    if !root.is_dir() {
        return Err(PublishError::PackagingFailed {
            artifact: root.display().to_string(),
            message: "入力ディレクトリが存在しません".to_string(),
        });
    }

    for entry in WalkDir::new(root).into_iter() {
        let entry = entry.map_err(|e| PublishError::PackagingFailed {
            artifact: root.display().to_string(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() || !include(entry.path()) {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entries.insert(name.clone(), entry.path().to_path_buf()).is_some() {
            tracing::warn!(entry = %name, "duplicate archive entry, keeping the last one");
        }
    }

    Ok(())
}

/// Write a jar: manifest first, then `entries` in order
fn write_archive(
    path: &Path,
    manifest: &Manifest,
    entries: &BTreeMap<String, PathBuf>,
) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    zip.start_file(MANIFEST_PATH, options)
        .map_err(|e| e.to_string())?;
    zip.write_all(&manifest.to_bytes())
        .map_err(|e| e.to_string())?;

    for (name, source) in entries {
        let bytes = fs::read(source).map_err(|e| format!("{}: {}", source.display(), e))?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| e.to_string())?;
        zip.write_all(&bytes).map_err(|e| e.to_string())?;
    }

    zip.finish().map_err(|e| e.to_string())?;
    Ok(())
}

/// Read the manifest of a jar, which must be its first entry
pub fn read_manifest(path: &Path) -> Result<Manifest, PublishError> {
    let artifact = path.display().to_string();
    let packaging_error = |message: String| PublishError::PackagingFailed {
        artifact: artifact.clone(),
        message,
    };

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| packaging_error(e.to_string()))?;
    let mut first = archive
        .by_index(0)
        .map_err(|e| packaging_error(e.to_string()))?;

    if first.name() != MANIFEST_PATH {
        return Err(packaging_error(format!(
            "先頭エントリが {} ではありません: {}",
            MANIFEST_PATH,
            first.name()
        )));
    }

    let mut content = String::new();
    first
        .read_to_string(&mut content)
        .map_err(|e| packaging_error(e.to_string()))?;
    Ok(Manifest::parse(&content))
}

/// Every archive must report `expected` as its Implementation-Version
pub fn verify_versions<'p>(
    expected: &str,
    archives: impl IntoIterator<Item = &'p Path>,
) -> Result<(), PublishError> {
    for path in archives {
        let manifest = read_manifest(path)?;
        let found = manifest.get("Implementation-Version").unwrap_or_default();
        if found != expected {
            return Err(PublishError::VersionMismatch {
                artifact: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(root: &Path) -> (PublishConfig, BuildLayout) {
        let mut config = PublishConfig::default();
        config.project.group = "com.deepl.api".to_string();
        config.project.artifact = "deepl-java".to_string();
        config.project.version = "1.3.0".to_string();
        let layout = BuildLayout::new(root, &config);

        let package = layout.source_dir.join("com/deepl/api");
        fs::create_dir_all(&package).unwrap();
        fs::write(package.join("Translator.java"), "class Translator {}").unwrap();
        fs::write(package.join("notes.txt"), "not java").unwrap();

        let classes = layout.classes_dir().join("com/deepl/api");
        fs::create_dir_all(&classes).unwrap();
        fs::write(classes.join("Translator.class"), [0xCA, 0xFE, 0xBA, 0xBE]).unwrap();

        fs::create_dir_all(&layout.resources_dir).unwrap();
        fs::write(layout.resources_dir.join("deepl.properties"), "a=b").unwrap();

        fs::create_dir_all(layout.javadoc_dir()).unwrap();
        fs::write(layout.javadoc_dir().join("index.html"), "<html/>").unwrap();

        (config, layout)
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_package_produces_three_archives() {
        let temp_dir = TempDir::new().unwrap();
        let (config, layout) = project(temp_dir.path());

        let set = ArtifactPackager::new(&config, &layout).package().unwrap();

        assert_eq!(set.artifacts.len(), 3);
        let names: Vec<String> = set.artifacts.iter().map(|a| a.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "deepl-java-1.3.0.jar",
                "deepl-java-1.3.0-sources.jar",
                "deepl-java-1.3.0-javadoc.jar"
            ]
        );
        for artifact in &set.artifacts {
            assert!(artifact.path.starts_with(layout.libs_dir()));
        }
    }

    #[test]
    fn test_manifests_agree_across_archives() {
        let temp_dir = TempDir::new().unwrap();
        let (config, layout) = project(temp_dir.path());

        let set = ArtifactPackager::new(&config, &layout).package().unwrap();

        let primary = read_manifest(&set.get(ArtifactKind::Primary).unwrap().path).unwrap();
        assert_eq!(primary.get("Implementation-Version"), Some("1.3.0"));
        assert_eq!(primary.get("Implementation-Title"), Some("Gradle"));

        for kind in [ArtifactKind::Sources, ArtifactKind::Javadoc] {
            let manifest = read_manifest(&set.get(kind).unwrap().path).unwrap();
            assert_eq!(manifest, primary);
        }
    }

    #[test]
    fn test_archive_entries() {
        let temp_dir = TempDir::new().unwrap();
        let (config, layout) = project(temp_dir.path());

        let set = ArtifactPackager::new(&config, &layout).package().unwrap();

        assert_eq!(
            entry_names(&set.get(ArtifactKind::Primary).unwrap().path),
            vec![
                "META-INF/MANIFEST.MF",
                "com/deepl/api/Translator.class",
                "deepl.properties"
            ]
        );
        assert_eq!(
            entry_names(&set.get(ArtifactKind::Sources).unwrap().path),
            vec!["META-INF/MANIFEST.MF", "com/deepl/api/Translator.java"]
        );
        assert_eq!(
            entry_names(&set.get(ArtifactKind::Javadoc).unwrap().path),
            vec!["META-INF/MANIFEST.MF", "index.html"]
        );
    }

    #[test]
    fn test_failure_leaves_no_archives() {
        let temp_dir = TempDir::new().unwrap();
        let (config, layout) = project(temp_dir.path());
        fs::remove_dir_all(layout.javadoc_dir()).unwrap();

        let result = ArtifactPackager::new(&config, &layout).package();

        assert!(matches!(result, Err(PublishError::PackagingFailed { .. })));
        let libs = layout.libs_dir();
        assert!(!libs.exists() || fs::read_dir(&libs).unwrap().next().is_none());
        assert!(fs::read_dir(layout.tmp_dir()).unwrap().next().is_none());
    }

    #[test]
    fn test_verify_versions_detects_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.jar");
        let bad = temp_dir.path().join("bad.jar");
        write_archive(
            &good,
            &Manifest::for_release("Gradle", "1.3.0", &BTreeMap::new()),
            &BTreeMap::new(),
        )
        .unwrap();
        write_archive(
            &bad,
            &Manifest::for_release("Gradle", "1.2.0", &BTreeMap::new()),
            &BTreeMap::new(),
        )
        .unwrap();

        assert!(verify_versions("1.3.0", [good.as_path()]).is_ok());
        match verify_versions("1.3.0", [good.as_path(), bad.as_path()]) {
            Err(PublishError::VersionMismatch { artifact, found, .. }) => {
                assert_eq!(artifact, "bad.jar");
                assert_eq!(found, "1.2.0");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_artifact_kind_naming() {
        let coords = Coordinates::new("com.deepl.api", "deepl-java", "1.3.0");
        let pom = ArtifactKind::Pom;
        assert_eq!(
            coords.file_name(pom.classifier(), pom.extension()),
            "deepl-java-1.3.0.pom"
        );
        assert_eq!(ArtifactKind::Javadoc.to_string(), "javadoc");
    }
}
